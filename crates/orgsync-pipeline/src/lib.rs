//! Sync pipeline for the orgsync core.
//!
//! Loads configuration, maps already-fetched connector records onto core
//! types, and produces the anonymized, deduplicated dataset handed to the
//! upload client.

pub mod config;
pub mod error;
pub mod records;
pub mod sync;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use records::{SyncInput, SyncOutput};
pub use sync::{SyncContext, run};
