//! Employee: the canonical person, bot or external record.
//!
//! `Team` and `Department` are derived from the employee's groups when the
//! value is built. `Hierarchy` is only present on values handed out by an
//! [`IdentityDirectory`](crate::directory::IdentityDirectory).

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  error::{Error, HashedEntity},
  group::{OrgGroup, category},
  hash::HashFunction,
  identity::Identity,
  relation::RelationSet,
};

// ─── Attributes ──────────────────────────────────────────────────────────────

/// Well-known attribute keys.
pub mod attribute {
  pub const TEAM: &str = "Team";
  pub const DEPARTMENT: &str = "Department";
  pub const HIERARCHY: &str = "Hierarchy";
}

/// Position of an employee in the reports-to forest.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum HierarchyRank {
  #[default]
  Unknown,
  IndividualContributor,
  Manager,
  Director,
  Board,
}

impl fmt::Display for HierarchyRank {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Unknown => "Unknown",
      Self::IndividualContributor => "IndividualContributor",
      Self::Manager => "Manager",
      Self::Director => "Director",
      Self::Board => "Board",
    };
    f.write_str(name)
  }
}

/// The value of one employee attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
  String(String),
  StringList(Vec<String>),
  Hierarchy(HierarchyRank),
  /// Escape hatch for connector-specific attributes.
  Json(serde_json::Value),
}

// ─── NewEmployee ─────────────────────────────────────────────────────────────

/// Input to [`Employee::new`].
#[derive(Debug, Clone)]
pub struct NewEmployee {
  pub id:          Identity,
  pub is_external: bool,
  pub is_bot:      bool,
  pub groups:      Vec<OrgGroup>,
  pub relations:   RelationSet,
  /// Custom attributes. Derived keys (`Team`, `Department`) are overwritten.
  pub attributes:  BTreeMap<String, AttributeValue>,
}

impl NewEmployee {
  /// An internal, non-bot employee with no groups, relations or attributes.
  pub fn new(id: Identity) -> Self {
    Self {
      id,
      is_external: false,
      is_bot: false,
      groups: Vec::new(),
      relations: RelationSet::new(),
      attributes: BTreeMap::new(),
    }
  }
}

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Employee {
  id:          Identity,
  is_external: bool,
  is_bot:      bool,
  is_hashed:   bool,
  attributes:  BTreeMap<String, AttributeValue>,
  groups:      Vec<OrgGroup>,
  relations:   RelationSet,
}

impl Employee {
  pub fn new(input: NewEmployee) -> Self {
    let NewEmployee {
      id,
      is_external,
      is_bot,
      groups,
      relations,
      mut attributes,
    } = input;

    attributes.remove(attribute::TEAM);
    attributes.remove(attribute::DEPARTMENT);
    attributes.remove(attribute::HIERARCHY);

    if let Some(team) = groups.iter().find(|g| g.is_category(category::TEAM)) {
      attributes.insert(
        attribute::TEAM.to_string(),
        AttributeValue::String(team.name.clone()),
      );
    }

    let departments: Vec<String> = groups
      .iter()
      .filter(|g| g.is_category(category::DEPARTMENT))
      .map(|g| g.name.clone())
      .collect();
    if !departments.is_empty() {
      attributes.insert(
        attribute::DEPARTMENT.to_string(),
        AttributeValue::StringList(departments),
      );
    }

    Self {
      is_hashed: id.is_hashed(),
      id,
      is_external,
      is_bot,
      attributes,
      groups,
      relations,
    }
  }

  /// A transient record for an identifier nobody claimed.
  pub fn external(alias: impl Into<String>) -> Self {
    Self::new(NewEmployee {
      is_external: true,
      ..NewEmployee::new(Identity::single(alias))
    })
  }

  pub fn id(&self) -> &Identity { &self.id }

  pub fn primary_id(&self) -> &str { self.id.primary_id() }

  pub fn is_external(&self) -> bool { self.is_external }

  pub fn is_bot(&self) -> bool { self.is_bot }

  pub fn is_hashed(&self) -> bool { self.is_hashed }

  pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
    &self.attributes
  }

  pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
    self.attributes.get(key)
  }

  pub fn groups(&self) -> &[OrgGroup] { &self.groups }

  pub fn relations(&self) -> &RelationSet { &self.relations }

  pub fn team(&self) -> Option<&str> {
    match self.attributes.get(attribute::TEAM) {
      Some(AttributeValue::String(team)) => Some(team.as_str()),
      _ => None,
    }
  }

  pub fn departments(&self) -> &[String] {
    match self.attributes.get(attribute::DEPARTMENT) {
      Some(AttributeValue::StringList(names)) => names.as_slice(),
      _ => &[],
    }
  }

  pub fn hierarchy(&self) -> Option<HierarchyRank> {
    match self.attributes.get(attribute::HIERARCHY) {
      Some(AttributeValue::Hierarchy(rank)) => Some(*rank),
      _ => None,
    }
  }

  pub(crate) fn set_hierarchy(&mut self, rank: HierarchyRank) {
    self.attributes.insert(
      attribute::HIERARCHY.to_string(),
      AttributeValue::Hierarchy(rank),
    );
  }

  /// Hash the identity, every group and every relation target. Attribute
  /// values are copied verbatim.
  pub fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    if self.is_hashed {
      return Err(Error::already_hashed(
        HashedEntity::Employee,
        self.id.primary_id(),
      ));
    }
    let groups = self
      .groups
      .into_iter()
      .map(|g| g.hash(hash))
      .collect::<Result<Vec<_>>>()?;
    Ok(Self {
      id: self.id.hash(hash)?,
      is_external: self.is_external,
      is_bot: self.is_bot,
      is_hashed: true,
      attributes: self.attributes,
      groups,
      relations: self.relations.hash(hash)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::relation::{Relation, SUPERVISOR};

  fn h(s: &str) -> String { format!("h({s})") }

  fn alice() -> NewEmployee {
    let mut input = NewEmployee::new(Identity::new(
      "alice@corp.io",
      "U1",
      ["alice"],
    ));
    input.groups = vec![
      OrgGroup::new("c1", "Corp", category::COMPANY),
      OrgGroup::new("t1", "Platform", category::TEAM),
      OrgGroup::new("d1", "Engineering", category::DEPARTMENT),
      OrgGroup::new("d2", "R&D", category::DEPARTMENT),
    ];
    input.relations = [Relation::supervisor("bob@corp.io")].into_iter().collect();
    input
  }

  #[test]
  fn team_and_department_are_derived_from_groups() {
    let e = Employee::new(alice());
    assert_eq!(e.team(), Some("Platform"));
    assert_eq!(e.departments(), ["Engineering", "R&D"]);
    assert_eq!(e.hierarchy(), None);
  }

  #[test]
  fn no_groups_means_no_derived_attributes() {
    let e = Employee::new(NewEmployee::new(Identity::single("x@corp.io")));
    assert_eq!(e.team(), None);
    assert!(e.departments().is_empty());
    assert!(e.attributes().is_empty());
  }

  #[test]
  fn caller_cannot_forge_derived_attributes() {
    let mut input = NewEmployee::new(Identity::single("x@corp.io"));
    input.attributes.insert(
      attribute::HIERARCHY.into(),
      AttributeValue::Hierarchy(HierarchyRank::Board),
    );
    input
      .attributes
      .insert("Title".into(), AttributeValue::String("Engineer".into()));
    let e = Employee::new(input);
    assert_eq!(e.hierarchy(), None);
    assert_eq!(
      e.attribute("Title"),
      Some(&AttributeValue::String("Engineer".into()))
    );
  }

  #[test]
  fn external_uses_alias_as_primary_id() {
    let e = Employee::external("stranger@else.io");
    assert!(e.is_external());
    assert!(!e.is_bot());
    assert_eq!(e.primary_id(), "stranger@else.io");
  }

  #[test]
  fn hashing_preserves_structure_not_values() {
    let e = Employee::new(alice()).hash(&h).unwrap();
    assert!(e.is_hashed());
    assert_eq!(e.primary_id(), "h(alice@corp.io)");
    for (group, raw) in e.groups().iter().zip(["c1", "t1", "d1", "d2"]) {
      assert_eq!(group.id, h(raw));
    }
    assert_eq!(
      e.relations().get_target(SUPERVISOR),
      Some(h("bob@corp.io").as_str())
    );
    // attribute values are not hashed
    assert_eq!(e.team(), Some("Platform"));
  }

  #[test]
  fn hashing_twice_fails() {
    let e = Employee::new(alice()).hash(&h).unwrap();
    assert!(matches!(
      e.hash(&h),
      Err(Error::AlreadyHashed {
        entity: HashedEntity::Employee,
        ..
      })
    ));
  }
}
