//! Named directed edges from one employee to another employee's primary id.

use serde::Serialize;

use crate::{
  Result,
  error::{Error, HashedEntity},
  hash::HashFunction,
};

/// The relation name meaning "reports to".
pub const SUPERVISOR: &str = "Supervisor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
  pub name:   String,
  /// Primary id (or any alias) of the related employee.
  pub target: String,
  is_hashed:  bool,
}

impl Relation {
  pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      name:      name.into(),
      target:    target.into(),
      is_hashed: false,
    }
  }

  pub fn supervisor(target: impl Into<String>) -> Self {
    Self::new(SUPERVISOR, target)
  }

  pub fn is_hashed(&self) -> bool { self.is_hashed }

  /// Hash the target. The relation name is structural and stays readable.
  pub fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    if self.is_hashed {
      return Err(Error::already_hashed(HashedEntity::Relation, &self.target));
    }
    Ok(Self {
      target: hash.hash(&self.target),
      is_hashed: true,
      ..self
    })
  }
}

/// The unordered bag of relations owned by one employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelationSet(Vec<Relation>);

impl RelationSet {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, relation: Relation) { self.0.push(relation); }

  pub fn contains(&self, name: &str) -> bool {
    self.0.iter().any(|r| r.name == name)
  }

  /// Target of the first relation called `name`.
  pub fn get_target(&self, name: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|r| r.name == name)
      .map(|r| r.target.as_str())
  }

  pub fn supervisor(&self) -> Option<&str> { self.get_target(SUPERVISOR) }

  pub fn iter(&self) -> impl Iterator<Item = &Relation> { self.0.iter() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    self
      .0
      .into_iter()
      .map(|r| r.hash(hash))
      .collect::<Result<Vec<_>>>()
      .map(Self)
  }
}

impl FromIterator<Relation> for RelationSet {
  fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn supervisor_lookup() {
    let set: RelationSet = [
      Relation::new("Mentor", "m@corp.io"),
      Relation::supervisor("boss@corp.io"),
    ]
    .into_iter()
    .collect();
    assert!(set.contains(SUPERVISOR));
    assert_eq!(set.get_target(SUPERVISOR), Some("boss@corp.io"));
    assert_eq!(set.get_target("Buddy"), None);
  }

  #[test]
  fn hashing_a_set_hashes_every_target() {
    let h = |s: &str| format!("h({s})");
    let set: RelationSet =
      [Relation::supervisor("boss@corp.io")].into_iter().collect();
    let hashed = set.hash(&h).unwrap();
    assert_eq!(hashed.supervisor(), Some("h(boss@corp.io)"));
    assert!(hashed.iter().all(Relation::is_hashed));
  }

  #[test]
  fn hashing_a_relation_twice_fails() {
    let h = |s: &str| format!("h({s})");
    let r = Relation::supervisor("boss").hash(&h).unwrap();
    assert!(matches!(
      r.hash(&h),
      Err(Error::AlreadyHashed {
        entity: HashedEntity::Relation,
        ..
      })
    ));
  }
}
