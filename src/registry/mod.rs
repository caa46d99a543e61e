// src/registry/mod.rs
//
// The registry has 12 columns:
//     cod_amm, cod_ou, cod_uni_ou, des_ou, regione, provincia, comune,
//     indirizzo, cap, cf, dt_verifica_cf, data_avvio_sfe
// Validating an addressee code only needs `cod_uni_ou` (the 6-char code) and
// `cf` (the administration's Codice Fiscale).
use serde::{Deserialize, Serialize};

pub mod encode;
pub mod parse;

pub use encode::write_csv;
pub use parse::RegistryReader;

pub const REGISTRY_COLUMNS: usize = 12;
pub const ADDRESSEE_CODE_COLUMN: usize = 2;
pub const FISCAL_CODE_COLUMN: usize = 9;

/// One `(cod_uni_ou, cf)` pair. Serialized as a headerless two-field CSV row
/// in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub addressee_code: String,
    pub fiscal_code: String,
}

impl ExtractedRecord {
    pub fn new(addressee_code: impl Into<String>, fiscal_code: impl Into<String>) -> Self {
        Self {
            addressee_code: addressee_code.into(),
            fiscal_code: fiscal_code.into(),
        }
    }
}
