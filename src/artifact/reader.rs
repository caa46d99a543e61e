// src/artifact/reader.rs
use std::{collections::HashMap, io::Read};

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::{info, instrument};

use super::ARTIFACT_KEY;
use crate::{
    error::{Error, Result},
    lookup::LookupTable,
    storage::ArtifactStore,
};

/// Fetch the artifact and build the lookup table from it.
///
/// Either the whole artifact loads or nothing is returned; a missing object
/// is `StorageUnavailable`, a damaged one `CorruptArtifact`.
#[instrument(level = "info", skip(store))]
pub async fn load_lookup_table(store: &dyn ArtifactStore) -> Result<LookupTable> {
    let bytes = store.get(ARTIFACT_KEY).await?;
    info!(key = ARTIFACT_KEY, bytes = bytes.len(), "fetched artifact");
    read_artifact(bytes.as_slice())
}

/// Gunzip and parse a headerless two-column CSV into a `LookupTable`.
pub fn read_artifact<R: Read>(reader: R) -> Result<LookupTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(GzDecoder::new(reader));

    let mut entries = HashMap::new();
    let mut duplicates = 0u64;
    let mut rows = 0u64;

    for result in rdr.records() {
        let record = result.map_err(|e| Error::CorruptArtifact {
            message: format!("after {} records: {}", rows, e),
        })?;
        if record.len() != 2 {
            return Err(Error::CorruptArtifact {
                message: format!("record {} has {} fields, expected 2", rows + 1, record.len()),
            });
        }
        if entries
            .insert(record[0].to_string(), record[1].to_string())
            .is_some()
        {
            duplicates += 1;
        }
        rows += 1;
    }

    info!(rows, entries = entries.len(), duplicates, "lookup table built");
    Ok(LookupTable::from(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        artifact::{commit, stage},
        logging::init_test_logging,
        storage::MemoryStore,
    };
    use chrono::Utc;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap()
    }

    fn big_feed(rows: usize) -> String {
        let mut feed = String::from("h1\th2\th3\th4\th5\th6\th7\th8\th9\th10\th11\th12\n");
        for i in 0..rows {
            feed.push_str(&format!(
                "c_{i}\tuo\tUF{i:04}\tUfficio numero {i}\tLazio\tRM\tRoma\tVia {i}\t00100\t{:011}\tx\ty\n",
                i * 7919
            ));
        }
        feed
    }

    #[test]
    fn reads_headerless_pairs() {
        let table = read_artifact(gzip("SUCCESS,ABCD\nUFAAAA,\"01,2\"\n").as_slice()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("SUCCESS"), Some("ABCD"));
        assert_eq!(table.get("UFAAAA"), Some("01,2"));
    }

    #[test]
    fn later_duplicates_win() {
        let table = read_artifact(gzip("A,1\nB,2\nA,3\n").as_slice()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A"), Some("3"));
    }

    #[test]
    fn same_artifact_loads_identically() {
        let bytes = gzip("A,1\nB,2\nC,3\n");
        let first = read_artifact(bytes.as_slice()).unwrap();
        let second = read_artifact(bytes.as_slice()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn not_gzip_is_corrupt() {
        let err = read_artifact(&b"SUCCESS,ABCD\n"[..]).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact { .. }));
    }

    #[test]
    fn truncated_artifact_is_corrupt() {
        let staged = stage(big_feed(2_000).as_bytes()).unwrap();
        let bytes = std::fs::read(staged.path()).unwrap();
        assert!(read_artifact(bytes.as_slice()).is_ok());

        for cut in [bytes.len() / 2, bytes.len() - 4, bytes.len() - 1] {
            let err = read_artifact(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, Error::CorruptArtifact { .. }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn wrong_field_count_is_corrupt() {
        for text in ["A,1\nlonely\n", "A,1,extra\n"] {
            let err = read_artifact(gzip(text).as_slice()).unwrap_err();
            assert!(matches!(err, Error::CorruptArtifact { .. }), "{text:?}");
        }
    }

    #[tokio::test]
    async fn staged_registry_loads_back_through_the_store() {
        init_test_logging();
        let store = MemoryStore::new();
        let staged = stage(big_feed(500).as_bytes()).unwrap();
        commit(&store, staged, Utc::now()).await.unwrap();

        let table = load_lookup_table(&store).await.unwrap();
        assert_eq!(table.len(), 500);
        assert_eq!(table.get("UF0000"), Some("00000000000"));
        assert_eq!(table.get("UF0499"), Some(format!("{:011}", 499 * 7919).as_str()));
    }

    #[tokio::test]
    async fn missing_artifact_is_unavailable() {
        let err = load_lookup_table(&MemoryStore::new()).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn corrupt_artifact_in_store_is_rejected() {
        let store = MemoryStore::new();
        store.insert(ARTIFACT_KEY, b"\x1f\x8b\x08\x00garbage".to_vec());
        let err = load_lookup_table(&store).await.unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact { .. }));
    }
}
