//! Identity: the set of strings that name one person across connectors.

use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::{
  Result,
  error::{Error, HashedEntity},
  filter::EmailFilter,
  hash::{HashFunction, hash_non_empty},
};

/// Case-folded form used for every identifier comparison.
pub(crate) fn fold(value: &str) -> String { value.to_lowercase() }

/// A primary id plus every alternative key that refers to the same person.
///
/// Equality and hashing use the primary id, case-insensitively.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
  primary_id:     String,
  data_source_id: String,
  username:       String,
  /// Insertion-ordered, without exact duplicates.
  aliases:        Vec<String>,
  is_hashed:      bool,
}

impl Identity {
  /// Build an identity, deriving the username from the primary id when it is
  /// email-shaped, otherwise from the first email-shaped alias.
  pub fn new<I, S>(
    primary_id: impl Into<String>,
    data_source_id: impl Into<String>,
    aliases: I,
  ) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::build(primary_id.into(), data_source_id.into(), aliases, |_| true)
  }

  /// Like [`Identity::new`], but only aliases the filter classifies as
  /// internal are considered for the username.
  pub fn with_filter<I, S>(
    primary_id: impl Into<String>,
    data_source_id: impl Into<String>,
    aliases: I,
    filter: &EmailFilter,
  ) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::build(primary_id.into(), data_source_id.into(), aliases, |alias| {
      filter.is_internal(alias)
    })
  }

  /// An identity known by a single string, as synthesized for externals.
  pub fn single(id: impl Into<String>) -> Self {
    let id = id.into();
    Self::new(id.clone(), id, std::iter::empty::<String>())
  }

  fn build<I, S>(
    primary_id: String,
    data_source_id: String,
    aliases: I,
    is_internal: impl Fn(&str) -> bool,
  ) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut unique: Vec<String> = Vec::new();
    for alias in aliases {
      let alias = alias.into();
      if !alias.is_empty() && !unique.contains(&alias) {
        unique.push(alias);
      }
    }

    let username = local_part(&primary_id)
      .or_else(|| {
        unique
          .iter()
          .filter(|alias| is_internal(alias.as_str()))
          .find_map(|alias| local_part(alias))
      })
      .unwrap_or(&primary_id)
      .to_string();

    Self {
      primary_id,
      data_source_id,
      username,
      aliases: unique,
      is_hashed: false,
    }
  }

  pub fn primary_id(&self) -> &str { &self.primary_id }

  pub fn data_source_id(&self) -> &str { &self.data_source_id }

  pub fn username(&self) -> &str { &self.username }

  pub fn aliases(&self) -> &[String] { &self.aliases }

  pub fn is_hashed(&self) -> bool { self.is_hashed }

  /// Primary id, data-source id and every alias, in that order.
  pub fn all_keys(&self) -> impl Iterator<Item = &str> {
    [self.primary_id.as_str(), self.data_source_id.as_str()]
      .into_iter()
      .chain(self.aliases.iter().map(String::as_str))
      .filter(|key| !key.is_empty())
  }

  /// Case-insensitive test against any key of this identity.
  pub fn matches(&self, alias: &str) -> bool {
    let needle = fold(alias);
    self.all_keys().any(|key| fold(key) == needle)
  }

  /// Replace every identifier with its image under `hash`.
  pub fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    if self.is_hashed {
      return Err(Error::already_hashed(
        HashedEntity::Identity,
        &self.primary_id,
      ));
    }
    Ok(Self {
      primary_id:     hash.hash(&self.primary_id),
      data_source_id: hash_non_empty(hash, &self.data_source_id),
      username:       hash_non_empty(hash, &self.username),
      aliases:        self.aliases.iter().map(|a| hash.hash(a)).collect(),
      is_hashed:      true,
    })
  }
}

impl PartialEq for Identity {
  fn eq(&self, other: &Self) -> bool {
    fold(&self.primary_id) == fold(&other.primary_id)
  }
}

impl Eq for Identity {}

impl Hash for Identity {
  fn hash<H: Hasher>(&self, state: &mut H) {
    fold(&self.primary_id).hash(state);
  }
}

fn local_part(value: &str) -> Option<&str> {
  match value.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
      Some(local)
    }
    _ => None,
  }
}
