//! Org-structure groups: companies, teams, departments, channels.
//!
//! Groups form a forest through `parent_id`. No cycle detection is done;
//! connectors are trusted to hand over well-formed trees.

use serde::Serialize;

use crate::{
  Result,
  error::{Error, HashedEntity},
  hash::HashFunction,
};

/// Well-known group categories. Connectors may use any other string.
pub mod category {
  pub const COMPANY: &str = "Company";
  pub const TEAM: &str = "Team";
  pub const DEPARTMENT: &str = "Department";
  pub const CHANNEL: &str = "Channel";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgGroup {
  pub id:        String,
  pub name:      String,
  pub category:  String,
  pub parent_id: Option<String>,
  is_hashed:     bool,
}

impl OrgGroup {
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    category: impl Into<String>,
  ) -> Self {
    Self {
      id:        id.into(),
      name:      name.into(),
      category:  category.into(),
      parent_id: None,
      is_hashed: false,
    }
  }

  pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
    self.parent_id = Some(parent_id.into());
    self
  }

  pub fn is_hashed(&self) -> bool { self.is_hashed }

  /// Case-insensitive category test.
  pub fn is_category(&self, category: &str) -> bool {
    self.category.eq_ignore_ascii_case(category)
  }

  /// Hash the group id and parent id. Name and category are kept so derived
  /// attributes stay readable.
  pub fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    if self.is_hashed {
      return Err(Error::already_hashed(HashedEntity::Group, &self.id));
    }
    Ok(Self {
      id: hash.hash(&self.id),
      parent_id: self.parent_id.as_deref().map(|p| hash.hash(p)),
      is_hashed: true,
      ..self
    })
  }
}
