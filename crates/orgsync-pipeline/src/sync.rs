//! One sync run: records in, canonical dataset out.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use orgsync_core::{
  Employee,
  HashFunction,
  IdentityDirectory,
  Interaction,
  criteria::{self, CriteriaPipeline},
  employee::{AttributeValue, NewEmployee},
  filter::EmailFilter,
  group::OrgGroup,
  hash::SaltedSha256,
  identity::Identity,
  interaction::{ActionTag, InteractionEndpoint, InteractionKind},
  relation::Relation,
  time_range::TimeRange,
};

use crate::{
  Result,
  config::SyncConfig,
  records::{EmployeeRecord, InteractionRecord, SyncInput, SyncOutput},
};

/// Everything a run needs besides the records themselves.
pub struct SyncContext {
  filter: EmailFilter,
  hash:   Option<Box<dyn HashFunction>>,
  range:  TimeRange,
}

impl SyncContext {
  pub fn new(filter: EmailFilter, range: TimeRange) -> Self {
    Self {
      filter,
      hash: None,
      range,
    }
  }

  pub fn with_hash_function(
    mut self,
    hash: impl HashFunction + 'static,
  ) -> Self {
    self.hash = Some(Box::new(hash));
    self
  }

  pub fn from_config(config: &SyncConfig) -> Result<Self> {
    let range = TimeRange::new(config.window_start, config.window_end)?;
    let filter = EmailFilter::new(&config.whitelist, config.blacklist.clone());
    let context = Self::new(filter, range);
    Ok(match &config.hash_salt {
      Some(salt) => context.with_hash_function(SaltedSha256::new(salt)),
      None => context,
    })
  }

  pub fn range(&self) -> TimeRange { self.range }

  pub fn is_hashing(&self) -> bool { self.hash.is_some() }

  fn hash_function(&self) -> Option<&dyn HashFunction> { self.hash.as_deref() }

  /// Map a record onto an employee. Forbidden addresses are skipped and
  /// every key they carry is added to `blocklist`.
  fn employee(
    &self,
    record: EmployeeRecord,
    blocklist: &mut Blocklist<'_>,
  ) -> Option<Employee> {
    if self.filter.is_forbidden(&record.id) {
      tracing::debug!(id = %record.id, "skipping forbidden employee");
      blocklist.extend(
        std::iter::once(&record.id)
          .chain(std::iter::once(&record.source_id))
          .chain(&record.aliases),
      );
      return None;
    }

    let is_internal = std::iter::once(&record.id)
      .chain(&record.aliases)
      .any(|alias| self.filter.is_internal(alias));

    let mut input = NewEmployee::new(Identity::with_filter(
      record.id,
      record.source_id,
      record.aliases,
      &self.filter,
    ));
    input.is_external = !is_internal;
    input.is_bot = record.is_bot;
    input.groups = record
      .groups
      .into_iter()
      .map(|g| {
        let group = OrgGroup::new(g.id, g.name, g.category);
        match g.parent_id {
          Some(parent) => group.with_parent(parent),
          None => group,
        }
      })
      .collect();
    input.relations = record.manager.map(Relation::supervisor).into_iter().collect();
    input.attributes = record
      .attributes
      .into_iter()
      .map(|(key, value)| (key, attribute_value(value)))
      .collect();

    Some(Employee::new(input))
  }

  /// Resolve both ends of `record` and build its interactions. Edges with a
  /// blocked address on either side are never built.
  fn interactions(
    &self,
    directory: &IdentityDirectory,
    blocklist: &Blocklist<'_>,
    record: &InteractionRecord,
  ) -> Vec<Interaction> {
    let endpoint =
      |alias: &str| InteractionEndpoint::from(&*directory.find(alias));
    let allowed = |alias: &&String| !blocklist.contains(alias);

    if blocklist.contains(record.source()) {
      return Vec::new();
    }

    match record {
      InteractionRecord::Email {
        timestamp,
        from,
        to,
        message_id,
      } => to
        .iter()
        .filter(allowed)
        .map(|recipient| {
          Interaction::create_email(
            *timestamp,
            endpoint(from),
            endpoint(recipient),
            message_id.clone(),
          )
        })
        .collect(),
      InteractionRecord::Meeting {
        timestamp,
        organizer,
        attendees,
        event_id,
        recurrence,
        duration_minutes,
      } => attendees
        .iter()
        .filter(allowed)
        .map(|attendee| {
          Interaction::create_meeting(
            *timestamp,
            endpoint(organizer),
            endpoint(attendee),
            event_id.clone(),
            *recurrence,
            *duration_minutes,
          )
        })
        .collect(),
      InteractionRecord::ChatThread {
        timestamp,
        from,
        to,
        channel_id,
        event_id,
      } if !blocklist.contains(to) => vec![Interaction::create_chat_thread(
        *timestamp,
        endpoint(from),
        endpoint(to),
        channel_id.clone(),
        event_id.clone(),
      )],
      InteractionRecord::ChatReply {
        timestamp,
        from,
        to,
        channel_id,
        event_id,
        parent_event_id,
      } if !blocklist.contains(to) => vec![Interaction::create_chat_reply(
        *timestamp,
        endpoint(from),
        endpoint(to),
        channel_id.clone(),
        event_id.clone(),
        parent_event_id.clone(),
      )],
      InteractionRecord::ChatReaction {
        timestamp,
        from,
        to,
        channel_id,
        event_id,
        parent_event_id,
      } if !blocklist.contains(to) => vec![Interaction::create_chat_reaction(
        *timestamp,
        endpoint(from),
        endpoint(to),
        channel_id.clone(),
        event_id.clone(),
        parent_event_id.clone(),
      )],
      InteractionRecord::ChatThread { .. }
      | InteractionRecord::ChatReply { .. }
      | InteractionRecord::ChatReaction { .. } => Vec::new(),
    }
  }
}

/// Addresses that must not appear on any exported edge: anything the
/// blacklist names, plus every key of a skipped forbidden employee.
struct Blocklist<'a> {
  filter: &'a EmailFilter,
  keys:   HashSet<String>,
}

impl<'a> Blocklist<'a> {
  fn new(filter: &'a EmailFilter) -> Self {
    Self {
      filter,
      keys: HashSet::new(),
    }
  }

  fn extend<'k>(&mut self, keys: impl IntoIterator<Item = &'k String>) {
    self.keys.extend(
      keys
        .into_iter()
        .filter(|key| !key.is_empty())
        .map(|key| key.to_lowercase()),
    );
  }

  fn contains(&self, alias: &str) -> bool {
    self.filter.is_forbidden(alias) || self.keys.contains(&alias.to_lowercase())
  }
}

/// Strings and string lists keep their typed form; anything else is JSON.
fn attribute_value(value: serde_json::Value) -> AttributeValue {
  match value {
    serde_json::Value::String(s) => AttributeValue::String(s),
    serde_json::Value::Array(items)
      if items.iter().all(serde_json::Value::is_string) =>
    {
      AttributeValue::StringList(
        items
          .into_iter()
          .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s),
            _ => None,
          })
          .collect(),
      )
    }
    other => AttributeValue::Json(other),
  }
}

type SortKey<'a> = (
  DateTime<Utc>,
  &'a str,
  &'a str,
  InteractionKind,
  Option<&'a str>,
  &'a BTreeSet<ActionTag>,
);

fn sort_key(interaction: &Interaction) -> SortKey<'_> {
  (
    interaction.timestamp(),
    interaction.source().id().primary_id(),
    interaction.target().id().primary_id(),
    interaction.kind(),
    interaction.channel_id(),
    interaction.action_tags(),
  )
}

/// Run one sync over already-fetched records.
///
/// Identities are resolved against a raw directory; hashing, when
/// configured, is applied to every outbound value afterwards so nothing raw
/// leaves the run.
pub fn run(context: &SyncContext, input: SyncInput) -> Result<SyncOutput> {
  let SyncInput {
    employees,
    interactions,
  } = input;

  let mut blocklist = Blocklist::new(&context.filter);
  let employees: Vec<Employee> = employees
    .into_iter()
    .filter_map(|record| context.employee(record, &mut blocklist))
    .collect();
  let directory = IdentityDirectory::new(employees, None)?;

  let raw: Vec<Interaction> = interactions
    .iter()
    .flat_map(|record| context.interactions(&directory, &blocklist, record))
    .collect();
  let raw_count = raw.len();

  let hashed = match context.hash_function() {
    Some(hash) => raw
      .into_iter()
      .map(|interaction| interaction.hash(hash))
      .collect::<orgsync_core::Result<Vec<_>>>()?,
    None => raw,
  };

  let filtered = CriteriaPipeline::standard(context.range).apply(hashed);
  let mut interactions: Vec<Interaction> =
    criteria::dedup(filtered).into_iter().collect();
  interactions.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

  let employees = directory
    .get_all_internal()
    .into_iter()
    .cloned()
    .map(|employee| match context.hash_function() {
      Some(hash) => employee.hash(hash),
      None => Ok(employee),
    })
    .collect::<orgsync_core::Result<Vec<_>>>()?;

  tracing::info!(
    employees = employees.len(),
    raw_interactions = raw_count,
    interactions = interactions.len(),
    collisions = directory.collisions().len(),
    hashed = context.is_hashing(),
    "sync run complete"
  );

  Ok(SyncOutput {
    employees,
    interactions,
  })
}
