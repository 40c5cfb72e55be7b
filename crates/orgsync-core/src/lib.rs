//! Identity resolution and interaction canonicalization for org-graph syncs.
//!
//! This crate is deliberately free of I/O. It turns already-fetched connector
//! records into a deduplicated, optionally hashed graph of employees and
//! interactions. Fetching, scheduling and uploading live elsewhere.

pub mod criteria;
pub mod directory;
pub mod employee;
pub mod error;
pub mod filter;
pub mod group;
pub mod hash;
pub mod identity;
pub mod interaction;
pub mod relation;
pub mod time_range;

pub use directory::IdentityDirectory;
pub use employee::Employee;
pub use error::{Error, Result};
pub use hash::HashFunction;
pub use identity::Identity;
pub use interaction::Interaction;
