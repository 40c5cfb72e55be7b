//! Sync configuration, read from an optional TOML file and `ORGSYNC_*`
//! environment variables.

use std::path::Path;

use chrono::{DateTime, Utc};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::Result;

/// Runtime configuration for one sync run.
#[derive(Clone, Deserialize)]
pub struct SyncConfig {
  /// Glob patterns for internal addresses. Empty admits everything.
  #[serde(default)]
  pub whitelist:    Vec<String>,
  /// Exact addresses that are never treated as internal.
  #[serde(default)]
  pub blacklist:    Vec<String>,
  /// Output is hashed with a salted SHA-256 when set.
  #[serde(default)]
  pub hash_salt:    Option<String>,
  pub window_start: DateTime<Utc>,
  pub window_end:   DateTime<Utc>,
}

impl SyncConfig {
  /// Load from `path` (if any) layered under the environment.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(File::from(path).required(true));
    }
    let settings = builder.add_source(environment()).build()?;
    Ok(settings.try_deserialize()?)
  }

  /// Parse a TOML document, ignoring the environment.
  pub fn from_toml(source: &str) -> Result<Self> {
    let settings = Config::builder()
      .add_source(File::from_str(source, FileFormat::Toml))
      .build()?;
    Ok(settings.try_deserialize()?)
  }
}

fn environment() -> Environment {
  Environment::with_prefix("ORGSYNC")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("whitelist")
    .with_list_parse_key("blacklist")
}

// Hand-written so the salt never ends up in logs.
impl std::fmt::Debug for SyncConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SyncConfig")
      .field("whitelist", &self.whitelist)
      .field("blacklist", &self.blacklist)
      .field("hash_salt", &self.hash_salt.as_ref().map(|_| "<redacted>"))
      .field("window_start", &self.window_start)
      .field("window_end", &self.window_end)
      .finish()
  }
}
