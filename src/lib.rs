//! Split-payment addressee-code validation.
//!
//! The `loader` binary turns the IndicePA e-invoicing registry into a
//! compressed `code,fiscal_code` table in object storage; the `validator`
//! binary loads that table once at startup and answers lookups over HTTP.

pub mod artifact;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod logging;
pub mod lookup;
pub mod registry;
pub mod server;
pub mod storage;

pub use error::{Error, Result};
