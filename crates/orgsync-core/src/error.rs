//! Error types for `orgsync-core`.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The kind of value a hashing error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashedEntity {
  Identity,
  Employee,
  Group,
  Relation,
  Interaction,
}

impl fmt::Display for HashedEntity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Identity => "identity",
      Self::Employee => "employee",
      Self::Group => "group",
      Self::Relation => "relation",
      Self::Interaction => "interaction",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// `hash()` was called on a value that has already been hashed. This is a
  /// pipeline-ordering bug in the caller and must not be retried.
  #[error("{entity} {id:?} is already hashed")]
  AlreadyHashed { entity: HashedEntity, id: String },

  #[error("invalid time range: start {start} is after end {end}")]
  InvalidTimeRange {
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },
}

impl Error {
  pub(crate) fn already_hashed(entity: HashedEntity, id: &str) -> Self {
    Self::AlreadyHashed {
      entity,
      id: id.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
