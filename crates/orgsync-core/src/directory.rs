//! IdentityDirectory: multi-key employee lookup and hierarchy classifier.
//!
//! Employees live in an arena and are indexed under every key they carry
//! (primary id, data-source id, aliases). Lookups are case-insensitive. The
//! first employee to claim a key keeps it; later claims are dropped and
//! reported as [`AliasCollision`]s.
//!
//! Hierarchy ranks are computed once, during construction, from the
//! "Supervisor" relations of internal employees.

use std::{
  borrow::Cow,
  collections::{HashMap, HashSet, hash_map::Entry},
};

use crate::{
  Result,
  employee::{Employee, HierarchyRank},
  hash::HashFunction,
  identity::fold,
  relation::SUPERVISOR,
};

/// A key claimed by more than one employee. Only `kept` is reachable through
/// `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCollision {
  pub alias:   String,
  /// Primary id of the employee that owns the key.
  pub kept:    String,
  /// Primary id of the employee whose claim was dropped.
  pub dropped: String,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
  employees:  Vec<Employee>,
  /// Case-folded key -> arena handle.
  index:      HashMap<String, usize>,
  /// Deduplicated handles of non-bot, non-external employees.
  internal:   Vec<usize>,
  ranks:      HashMap<usize, HierarchyRank>,
  collisions: Vec<AliasCollision>,
}

impl IdentityDirectory {
  /// Build a directory, hashing every employee first when `hash` is given.
  ///
  /// Alias collisions are logged at `debug` level.
  pub fn new<I>(employees: I, hash: Option<&dyn HashFunction>) -> Result<Self>
  where
    I: IntoIterator<Item = Employee>,
  {
    Self::with_collision_hook(employees, hash, |collision| {
      tracing::debug!(
        alias = %collision.alias,
        kept = %collision.kept,
        dropped = %collision.dropped,
        "alias already claimed; keeping first employee"
      );
    })
  }

  /// Like [`IdentityDirectory::new`], reporting each alias collision to
  /// `on_collision`.
  pub fn with_collision_hook<I, F>(
    employees: I,
    hash: Option<&dyn HashFunction>,
    mut on_collision: F,
  ) -> Result<Self>
  where
    I: IntoIterator<Item = Employee>,
    F: FnMut(&AliasCollision),
  {
    let mut directory = Self::default();

    for employee in employees {
      let employee = match hash {
        Some(hash) => employee.hash(hash)?,
        None => employee,
      };
      directory.insert(employee, &mut on_collision);
    }

    directory.internal = directory.collect_internal();
    directory.ranks = directory.classify();
    for (&handle, &rank) in &directory.ranks {
      directory.employees[handle].set_hierarchy(rank);
    }

    tracing::debug!(
      employees = directory.employees.len(),
      internal = directory.internal.len(),
      keys = directory.index.len(),
      collisions = directory.collisions.len(),
      "identity directory built"
    );

    Ok(directory)
  }

  fn insert(
    &mut self,
    employee: Employee,
    on_collision: &mut impl FnMut(&AliasCollision),
  ) {
    let handle = self.employees.len();
    for key in employee.id().all_keys() {
      match self.index.entry(fold(key)) {
        Entry::Vacant(slot) => {
          slot.insert(handle);
        }
        Entry::Occupied(slot) if *slot.get() != handle => {
          let collision = AliasCollision {
            alias:   key.to_string(),
            kept:    self.employees[*slot.get()].primary_id().to_string(),
            dropped: employee.primary_id().to_string(),
          };
          on_collision(&collision);
          self.collisions.push(collision);
        }
        Entry::Occupied(_) => {}
      }
    }
    self.employees.push(employee);
  }

  /// Reachable, non-bot, non-external employees, deduplicated on
  /// `(primary_id, data_source_id)` in insertion order.
  fn collect_internal(&self) -> Vec<usize> {
    let reachable: HashSet<usize> = self.index.values().copied().collect();
    let mut seen = HashSet::new();
    (0..self.employees.len())
      .filter(|handle| reachable.contains(handle))
      .filter(|&handle| {
        let e = &self.employees[handle];
        !e.is_bot() && !e.is_external()
      })
      .filter(|&handle| {
        let id = self.employees[handle].id();
        seen.insert((fold(id.primary_id()), fold(id.data_source_id())))
      })
      .collect()
  }

  /// Two fixed passes over the internal employees.
  ///
  /// Pass 1 marks employees with at least one subordinate as `Manager`, the
  /// rest as `IndividualContributor`. Pass 2 reads the pass-1 ranks: anyone
  /// with a `Manager` subordinate becomes `Director`, then anyone without a
  /// supervisor becomes `Board`, overriding `Director`.
  fn classify(&self) -> HashMap<usize, HierarchyRank> {
    // Case-folded manager primary id -> subordinate handles.
    let mut subordinates: HashMap<String, Vec<usize>> = HashMap::new();
    for &handle in &self.internal {
      if let Some(target) = self.employees[handle].relations().supervisor() {
        let manager = match self.resolve(target) {
          Some(manager) => fold(self.employees[manager].primary_id()),
          // Unknown targets resolve to an external named by the target.
          None => fold(target),
        };
        subordinates.entry(manager).or_default().push(handle);
      }
    }
    let subordinates_of: HashMap<usize, Vec<usize>> = self
      .internal
      .iter()
      .map(|&handle| {
        let key = fold(self.employees[handle].primary_id());
        (handle, subordinates.get(&key).cloned().unwrap_or_default())
      })
      .collect();

    let first_pass: HashMap<usize, HierarchyRank> = self
      .internal
      .iter()
      .map(|&handle| {
        let rank = if subordinates_of[&handle].is_empty() {
          HierarchyRank::IndividualContributor
        } else {
          HierarchyRank::Manager
        };
        (handle, rank)
      })
      .collect();

    let mut ranks = first_pass.clone();
    for &handle in &self.internal {
      let manages_managers = subordinates_of[&handle]
        .iter()
        .any(|s| first_pass.get(s) == Some(&HierarchyRank::Manager));
      if manages_managers {
        ranks.insert(handle, HierarchyRank::Director);
      }
      if !self.employees[handle].relations().contains(SUPERVISOR) {
        ranks.insert(handle, HierarchyRank::Board);
      }
    }
    ranks
  }

  fn resolve(&self, alias: &str) -> Option<usize> {
    self.index.get(&fold(alias)).copied()
  }

  /// Resolve `alias` to its employee. Unknown aliases yield a fresh external
  /// employee whose primary id is `alias`; it is not added to the directory.
  pub fn find(&self, alias: &str) -> Cow<'_, Employee> {
    match self.resolve(alias) {
      Some(handle) => Cow::Borrowed(&self.employees[handle]),
      None => Cow::Owned(Employee::external(alias)),
    }
  }

  pub fn contains(&self, alias: &str) -> bool {
    self.resolve(alias).is_some()
  }

  /// Every indexed, non-bot employee once, with its `Hierarchy` attribute
  /// set.
  pub fn get_all_internal(&self) -> Vec<&Employee> {
    self
      .internal
      .iter()
      .map(|&handle| &self.employees[handle])
      .collect()
  }

  /// Hierarchy rank of the employee behind `alias`, if it was classified.
  pub fn hierarchy(&self, alias: &str) -> Option<HierarchyRank> {
    self
      .resolve(alias)
      .and_then(|handle| self.ranks.get(&handle).copied())
  }

  pub fn collisions(&self) -> &[AliasCollision] { &self.collisions }

  /// Number of employees that were added, reachable or not.
  pub fn len(&self) -> usize { self.employees.len() }

  pub fn is_empty(&self) -> bool { self.employees.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    employee::NewEmployee,
    identity::Identity,
    relation::{Relation, RelationSet},
  };

  fn employee(
    primary: &str,
    source_id: &str,
    aliases: &[&str],
    supervisor: Option<&str>,
  ) -> Employee {
    let mut input = NewEmployee::new(Identity::new(
      primary,
      source_id,
      aliases.iter().copied(),
    ));
    input.relations = supervisor
      .map(Relation::supervisor)
      .into_iter()
      .collect::<RelationSet>();
    Employee::new(input)
  }

  fn bot(primary: &str) -> Employee {
    let mut input = NewEmployee::new(Identity::single(primary));
    input.is_bot = true;
    Employee::new(input)
  }

  fn org() -> Vec<Employee> {
    vec![
      employee("ic1@corp.io", "U01", &["ic1"], Some("manager1@corp.io")),
      employee("ic2@corp.io", "U02", &["ic2"], Some("mgr1")),
      employee(
        "manager1@corp.io",
        "U03",
        &["mgr1"],
        Some("director1@corp.io"),
      ),
      employee("director1@corp.io", "U04", &[], Some("board1@corp.io")),
      employee("board1@corp.io", "U05", &[], None),
    ]
  }

  fn h(s: &str) -> String { format!("#{s}") }

  #[test]
  fn aliases_converge_on_one_employee() {
    let dir = IdentityDirectory::new(org(), None).unwrap();
    for key in ["manager1@corp.io", "U03", "mgr1", "MGR1", "Manager1@Corp.io"] {
      assert_eq!(dir.find(key).primary_id(), "manager1@corp.io");
      assert!(!dir.find(key).is_external());
    }
  }

  #[test]
  fn unknown_alias_synthesizes_an_external() {
    let dir = IdentityDirectory::new(org(), None).unwrap();
    for _ in 0..2 {
      let e = dir.find("stranger@else.io");
      assert!(e.is_external());
      assert_eq!(e.primary_id(), "stranger@else.io");
    }
    assert!(!dir.contains("stranger@else.io"));
    assert_eq!(dir.len(), 5);
  }

  #[test]
  fn hierarchy_is_classified_from_supervisor_relations() {
    let dir = IdentityDirectory::new(org(), None).unwrap();
    assert_eq!(dir.hierarchy("board1@corp.io"), Some(HierarchyRank::Board));
    assert_eq!(
      dir.hierarchy("director1@corp.io"),
      Some(HierarchyRank::Director)
    );
    assert_eq!(dir.hierarchy("mgr1"), Some(HierarchyRank::Manager));
    assert_eq!(
      dir.hierarchy("ic1"),
      Some(HierarchyRank::IndividualContributor)
    );
    assert_eq!(
      dir.hierarchy("ic2@corp.io"),
      Some(HierarchyRank::IndividualContributor)
    );
    assert_eq!(dir.hierarchy("stranger@else.io"), None);
  }

  #[test]
  fn classified_employees_expose_their_rank() {
    let dir = IdentityDirectory::new(org(), None).unwrap();
    assert_eq!(
      dir.find("U05").hierarchy(),
      Some(HierarchyRank::Board)
    );
    assert!(dir.get_all_internal().iter().all(|e| e.hierarchy().is_some()));
  }

  #[test]
  fn root_with_managerial_reports_is_board_not_director() {
    let dir = IdentityDirectory::new(
      vec![
        employee("root", "", &[], None),
        employee("mid", "", &[], Some("root")),
        employee("leaf", "", &[], Some("mid")),
      ],
      None,
    )
    .unwrap();
    assert_eq!(dir.hierarchy("root"), Some(HierarchyRank::Board));
    assert_eq!(dir.hierarchy("mid"), Some(HierarchyRank::Manager));
  }

  #[test]
  fn deep_chain_uses_first_pass_ranks() {
    let dir = IdentityDirectory::new(
      vec![
        employee("a", "", &[], None),
        employee("b", "", &[], Some("a")),
        employee("c", "", &[], Some("b")),
        employee("d", "", &[], Some("c")),
        employee("e", "", &[], Some("d")),
      ],
      None,
    )
    .unwrap();
    assert_eq!(dir.hierarchy("a"), Some(HierarchyRank::Board));
    assert_eq!(dir.hierarchy("b"), Some(HierarchyRank::Director));
    assert_eq!(dir.hierarchy("c"), Some(HierarchyRank::Director));
    assert_eq!(dir.hierarchy("d"), Some(HierarchyRank::Manager));
    assert_eq!(
      dir.hierarchy("e"),
      Some(HierarchyRank::IndividualContributor)
    );
  }

  #[test]
  fn supervisor_outside_directory_contributes_nothing() {
    let dir = IdentityDirectory::new(
      vec![employee("solo@corp.io", "U1", &[], Some("ghost@else.io"))],
      None,
    )
    .unwrap();
    assert_eq!(
      dir.hierarchy("solo@corp.io"),
      Some(HierarchyRank::IndividualContributor)
    );
  }

  #[test]
  fn cycles_terminate() {
    let dir = IdentityDirectory::new(
      vec![
        employee("a", "", &[], Some("b")),
        employee("b", "", &[], Some("a")),
      ],
      None,
    )
    .unwrap();
    assert_eq!(dir.hierarchy("a"), Some(HierarchyRank::Director));
    assert_eq!(dir.hierarchy("b"), Some(HierarchyRank::Director));
  }

  #[test]
  fn first_claim_on_an_alias_wins() {
    let mut reported = Vec::new();
    let dir = IdentityDirectory::with_collision_hook(
      vec![
        employee("first@corp.io", "U1", &["shared"], None),
        employee("second@corp.io", "U2", &["SHARED"], None),
      ],
      None,
      |c| reported.push(c.clone()),
    )
    .unwrap();

    assert_eq!(dir.find("shared").primary_id(), "first@corp.io");
    assert_eq!(dir.find("U2").primary_id(), "second@corp.io");
    assert_eq!(reported, dir.collisions());
    assert_eq!(reported, [AliasCollision {
      alias:   "SHARED".into(),
      kept:    "first@corp.io".into(),
      dropped: "second@corp.io".into(),
    }]);
  }

  #[test]
  fn own_keys_do_not_collide() {
    let dir = IdentityDirectory::new(
      vec![employee("jane@corp.io", "jane@corp.io", &["Jane@Corp.io"], None)],
      None,
    )
    .unwrap();
    assert!(dir.collisions().is_empty());
  }

  #[test]
  fn get_all_internal_deduplicates_and_skips_bots() {
    let mut employees = org();
    employees.push(bot("deploy-bot"));
    // Same (primary, source) pair as ic1, only reachable through a new alias.
    employees.push(employee("IC1@corp.io", "u01", &["ic1-dup"], None));
    let mut external = NewEmployee::new(Identity::single("vendor@else.io"));
    external.is_external = true;
    employees.push(Employee::new(external));

    let dir = IdentityDirectory::new(employees, None).unwrap();
    let internal: Vec<&str> = dir
      .get_all_internal()
      .iter()
      .map(|e| e.primary_id())
      .collect();
    assert_eq!(internal, [
      "ic1@corp.io",
      "ic2@corp.io",
      "manager1@corp.io",
      "director1@corp.io",
      "board1@corp.io",
    ]);
    assert!(dir.contains("deploy-bot"));
    assert_eq!(dir.hierarchy("deploy-bot"), None);
    assert!(dir.find("vendor@else.io").is_external());
  }

  #[test]
  fn hashed_directory_exposes_only_hashed_values() {
    let dir = IdentityDirectory::new(org(), Some(&h)).unwrap();

    assert!(dir.get_all_internal().iter().all(|e| e.is_hashed()));
    assert_eq!(dir.find(&h("mgr1")).primary_id(), h("manager1@corp.io"));
    assert!(dir.find("mgr1").is_external());
    assert_eq!(dir.hierarchy(&h("board1@corp.io")), Some(HierarchyRank::Board));
    assert_eq!(
      dir.hierarchy(&h("ic2@corp.io")),
      Some(HierarchyRank::IndividualContributor)
    );
  }

  #[test]
  fn hashing_already_hashed_input_fails() {
    let hashed = employee("x@corp.io", "U1", &[], None).hash(&h).unwrap();
    assert!(IdentityDirectory::new(vec![hashed], Some(&h)).is_err());
  }
}
