// src/registry/parse.rs
use std::io::BufRead;

use tracing::{debug, warn};

use super::{ExtractedRecord, ADDRESSEE_CODE_COLUMN, FISCAL_CODE_COLUMN, REGISTRY_COLUMNS};
use crate::error::{Error, Result};

const DELIMITER: u8 = b'\t';

/// Lazily turns a registry feed into `ExtractedRecord`s, one line at a time.
///
/// Line 0 is the header and is skipped by position. Every later line, blank
/// ones included, must have at least `FISCAL_CODE_COLUMN + 1` tab separated fields.
/// Only the two extracted fields are decoded as UTF-8; the descriptive
/// columns are never looked at.
///
/// After the first error the iterator is exhausted.
pub struct RegistryReader<R> {
    reader: R,
    buf: Vec<u8>,
    line: u64,
    done: bool,
}

impl<R: BufRead> RegistryReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(512),
            line: 0,
            done: false,
        }
    }

    /// Lines consumed so far, header included.
    pub fn lines_read(&self) -> u64 {
        self.line
    }

    /// Reads the next raw line into `buf`, without its line terminator.
    fn next_line(&mut self) -> Result<bool> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| Error::FeedRead {
                line: self.line,
                source,
            })?;
        if n == 0 {
            return Ok(false);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(true)
    }

    fn extract(&self, line: u64) -> Result<ExtractedRecord> {
        let mut code = None;
        let mut fiscal = None;
        let mut found = 0usize;

        for (idx, field) in self.buf.split(|b| *b == DELIMITER).enumerate() {
            match idx {
                ADDRESSEE_CODE_COLUMN => code = Some(field),
                FISCAL_CODE_COLUMN => fiscal = Some(field),
                _ => {}
            }
            found = idx + 1;
        }

        let (Some(code), Some(fiscal)) = (code, fiscal) else {
            return Err(Error::MalformedRow {
                line,
                reason: format!(
                    "expected at least {} tab separated fields, found {}",
                    FISCAL_CODE_COLUMN + 1,
                    found
                ),
            });
        };
        if found != REGISTRY_COLUMNS {
            debug!(line, found, "registry row has an unexpected column count");
        }

        let decode = |bytes: &[u8], column: usize| {
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| Error::MalformedRow {
                    line,
                    reason: format!("column {} is not valid UTF-8: {}", column, e),
                })
        };

        Ok(ExtractedRecord {
            addressee_code: decode(code, ADDRESSEE_CODE_COLUMN)?,
            fiscal_code: decode(fiscal, FISCAL_CODE_COLUMN)?,
        })
    }
}

impl<R: BufRead> Iterator for RegistryReader<R> {
    type Item = Result<ExtractedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            match self.next_line() {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }

            let row = self.line;
            self.line += 1;

            if row == 0 {
                let columns = self.buf.split(|b| *b == DELIMITER).count();
                if columns != REGISTRY_COLUMNS {
                    warn!(columns, "registry header has an unexpected column count");
                } else {
                    debug!(columns, "skipped registry header");
                }
                continue;
            }
            let record = self.extract(row);
            if record.is_err() {
                self.done = true;
            }
            return Some(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Read};

    const HEADER: &str = "cod_amm\tcod_ou\tcod_uni_ou\tdes_ou\tregione\tprovincia\tcomune\tindirizzo\tcap\tcf\tdt_verifica_cf\tdata_avvio_sfe";

    fn parse(text: &str) -> Result<Vec<ExtractedRecord>> {
        RegistryReader::new(text.as_bytes()).collect()
    }

    #[test]
    fn skips_header_and_extracts_code_and_fiscal_code() {
        let text = format!("{HEADER}\nA\tB\tC\tD\tE\tF\tG\tH\tI\tJ\tK\tL");
        let records = parse(&text).unwrap();
        assert_eq!(records, vec![ExtractedRecord::new("C", "J")]);
    }

    #[test]
    fn header_is_positional_not_by_content() {
        let text = "h1\th2\th3\th4\th5\th6\th7\th8\th9\th10\th11\th12\nA\tB\tC\tD\tE\tF\tG\tH\tI\tJ\tK\tL";
        assert_eq!(parse(text).unwrap(), vec![ExtractedRecord::new("C", "J")]);

        // a "header" that looks like data is still skipped
        let text = "A\tB\tC\tD\tE\tF\tG\tH\tI\tJ\tK\tL\nm\tn\tUFXYZ1\tx\tx\tx\tx\tx\tx\t80012345678\tx\tx\n";
        assert_eq!(
            parse(text).unwrap(),
            vec![ExtractedRecord::new("UFXYZ1", "80012345678")]
        );
    }

    #[test]
    fn yields_one_record_per_data_row_in_order() {
        let mut text = String::from(HEADER);
        for i in 0..250 {
            text.push('\n');
            let row: Vec<String> = (0..12).map(|c| format!("r{i}c{c}")).collect();
            text.push_str(&row.join("\t"));
        }
        text.push('\n');

        let records = parse(&text).unwrap();
        assert_eq!(records.len(), 250);
        for (i, rec) in records.iter().enumerate() {
            assert_eq!(rec.addressee_code, format!("r{i}c2"));
            assert_eq!(rec.fiscal_code, format!("r{i}c9"));
        }
    }

    #[test]
    fn empty_and_header_only_inputs_are_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse(HEADER).unwrap().is_empty());
        assert!(parse(&format!("{HEADER}\n")).unwrap().is_empty());
    }

    #[test]
    fn tabs_only_spaces_stay_inside_fields() {
        let text = format!(
            "{HEADER}\r\nA\tB\tUF 001\tComune di Roma\tLazio\tRM\tRoma\tVia del Campidoglio 1\t00186\t 02438750586\tx\ty\r\n"
        );
        assert_eq!(
            parse(&text).unwrap(),
            vec![ExtractedRecord::new("UF 001", " 02438750586")]
        );
    }

    #[test]
    fn short_row_fails_instead_of_truncating() {
        let text = format!("{HEADER}\nA\tB\tC\tD\tE\tF\tG\tH\tI\tJ\nA\tB\tC\tD\tE\tF\tG\tH\tI\n");
        let mut reader = RegistryReader::new(text.as_bytes());

        assert_eq!(reader.next().unwrap().unwrap(), ExtractedRecord::new("C", "J"));
        match reader.next() {
            Some(Err(Error::MalformedRow { line, reason })) => {
                assert_eq!(line, 2);
                assert!(reason.contains("found 9"), "{reason}");
            }
            other => panic!("expected malformed row, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn blank_line_is_a_one_field_row() {
        let text = format!("{HEADER}\n\nA\tB\tC\tD\tE\tF\tG\tH\tI\tJ\tK\tL\n");
        let mut reader = RegistryReader::new(text.as_bytes());
        match reader.next() {
            Some(Err(Error::MalformedRow { line, reason })) => {
                assert_eq!(line, 1);
                assert!(reason.contains("found 1"), "{reason}");
            }
            other => panic!("expected malformed row, got {other:?}"),
        }
        assert!(reader.next().is_none());
        assert_eq!(reader.lines_read(), 2);
    }

    #[test]
    fn lines_read_counts_the_header() {
        let text = format!("{HEADER}\nA\tB\tC\tD\tE\tF\tG\tH\tI\tJ\tK\tL\n");
        let mut reader = RegistryReader::new(text.as_bytes());
        assert_eq!(reader.by_ref().count(), 1);
        assert_eq!(reader.lines_read(), 2);
    }

    #[test]
    fn undecodable_descriptive_columns_are_ignored() {
        let mut bytes = format!("{HEADER}\n").into_bytes();
        bytes.extend_from_slice(b"A\tB\tUFAAAA\tComune di Cant\xf9\tE\tF\tG\tH\tI\t00001\tK\tL\n");
        let records: Result<Vec<_>> = RegistryReader::new(bytes.as_slice()).collect();
        assert_eq!(records.unwrap(), vec![ExtractedRecord::new("UFAAAA", "00001")]);
    }

    #[test]
    fn undecodable_extracted_column_is_malformed() {
        let mut bytes = format!("{HEADER}\n").into_bytes();
        bytes.extend_from_slice(b"A\tB\tUF\xffAA\tD\tE\tF\tG\tH\tI\t00001\tK\tL\n");
        let err = RegistryReader::new(bytes.as_slice())
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRow { line: 1, .. }));
    }

    struct FailingRead;

    impl Read for FailingRead {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
        }
    }

    #[test]
    fn read_errors_surface_as_feed_errors() {
        let source = HEADER.as_bytes().chain(FailingRead);
        let err = RegistryReader::new(BufReader::new(source))
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(matches!(err, Error::FeedRead { .. }));
    }
}
