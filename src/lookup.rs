// src/lookup.rs
use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};

pub const ADDRESSEE_CODE_PARAM: &str = "addresseeCode";

/// Addressee code → Codice Fiscale, frozen once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    pub fn get(&self, addressee_code: &str) -> Option<&str> {
        self.entries.get(addressee_code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for LookupTable {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

/// Later pairs win over earlier ones with the same code.
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Response body of the validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    #[serde(rename = "fiscalCode", skip_serializing_if = "Option::is_none")]
    pub fiscal_code: Option<String>,
}

impl ValidationResult {
    pub fn found(fiscal_code: impl Into<String>) -> Self {
        Self {
            success: true,
            fiscal_code: Some(fiscal_code.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: false,
            fiscal_code: None,
        }
    }
}

/// Look up `query` exactly as given. A missing or empty query is a client
/// error; an unknown code is a normal `success: false` answer.
pub fn validate(table: &LookupTable, query: Option<&str>) -> Result<ValidationResult> {
    let code = match query {
        Some(code) if !code.is_empty() => code,
        _ => {
            return Err(Error::InvalidRequest {
                param: ADDRESSEE_CODE_PARAM,
            })
        }
    };

    Ok(match table.get(code) {
        Some(fiscal_code) => ValidationResult::found(fiscal_code),
        None => ValidationResult::not_found(),
    })
}
