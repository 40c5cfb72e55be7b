//! One-way hash functions applied to identifiers before they leave the
//! process.
//!
//! The core treats a hash function as opaque and deterministic. Production
//! runs use [`SaltedSha256`]; tests inject plain closures.

use sha2::{Digest, Sha256};

/// A deterministic, irreversible `string -> string` mapping.
pub trait HashFunction: Send + Sync {
  fn hash(&self, value: &str) -> String;
}

impl<F> HashFunction for F
where
  F: Fn(&str) -> String + Send + Sync,
{
  fn hash(&self, value: &str) -> String { self(value) }
}

/// Lowercase hex SHA-256 over `salt || value`.
#[derive(Clone)]
pub struct SaltedSha256 {
  salt: Vec<u8>,
}

impl SaltedSha256 {
  pub fn new(salt: impl AsRef<[u8]>) -> Self {
    Self {
      salt: salt.as_ref().to_vec(),
    }
  }
}

impl HashFunction for SaltedSha256 {
  fn hash(&self, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&self.salt);
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
  }
}

// The salt must never show up in logs.
impl std::fmt::Debug for SaltedSha256 {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SaltedSha256").finish_non_exhaustive()
  }
}

/// Hash `value` unless it is empty. Optional identifiers stay empty so that
/// "absent" survives hashing.
pub(crate) fn hash_non_empty(hash: &dyn HashFunction, value: &str) -> String {
  if value.is_empty() {
    String::new()
  } else {
    hash.hash(value)
  }
}
