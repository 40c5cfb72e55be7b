//! Interaction: one canonical communication edge between two identities.
//!
//! Every factory floors the raw event time into a bucket (10 minutes for
//! email and chat, 60 minutes for meetings). Together with structural
//! equality this collapses near-duplicate raw records into one edge: two
//! interactions are equal when timestamp, endpoints, channel, kind and action
//! tags match, whatever their event ids, recurrence or duration.

use std::{
  collections::BTreeSet,
  hash::{Hash, Hasher},
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  employee::Employee,
  error::{Error, HashedEntity},
  hash::{HashFunction, hash_non_empty},
  identity::Identity,
};

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum InteractionKind {
  Email,
  Meeting,
  Chat,
}

impl InteractionKind {
  /// Granularity that raw timestamps of this kind are floored to.
  pub fn bucket_size(self) -> TimeDelta {
    match self {
      Self::Email | Self::Chat => TimeDelta::minutes(10),
      Self::Meeting => TimeDelta::minutes(60),
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Recurrence {
  Daily,
  Weekly,
  Monthly,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ActionTag {
  Thread,
  Reply,
  Reaction,
}

/// Floor `instant` to a multiple of `size` since the Unix epoch.
pub fn bucket(instant: DateTime<Utc>, size: TimeDelta) -> DateTime<Utc> {
  let span = size.num_seconds().max(1);
  let floored = instant.timestamp().div_euclid(span) * span;
  // `floored` never exceeds `instant`, so it is always representable.
  DateTime::from_timestamp(floored, 0).unwrap_or(instant)
}

// ─── Endpoint ────────────────────────────────────────────────────────────────

/// The slice of an [`Employee`] an interaction needs.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionEndpoint {
  id:          Identity,
  is_external: bool,
  is_bot:      bool,
  is_hashed:   bool,
}

impl InteractionEndpoint {
  pub fn new(id: Identity, is_external: bool, is_bot: bool) -> Self {
    Self {
      is_hashed: id.is_hashed(),
      id,
      is_external,
      is_bot,
    }
  }

  pub fn id(&self) -> &Identity { &self.id }

  pub fn is_external(&self) -> bool { self.is_external }

  pub fn is_bot(&self) -> bool { self.is_bot }

  pub fn is_hashed(&self) -> bool { self.is_hashed }

  fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    Ok(Self {
      id: self.id.hash(hash)?,
      is_hashed: true,
      ..self
    })
  }
}

impl From<&Employee> for InteractionEndpoint {
  fn from(employee: &Employee) -> Self {
    Self::new(employee.id().clone(), employee.is_external(), employee.is_bot())
  }
}

// ─── Interaction ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
  is_hashed:        bool,
  /// Bucketed, never the raw event time.
  timestamp:        DateTime<Utc>,
  source:           InteractionEndpoint,
  target:           InteractionEndpoint,
  kind:             InteractionKind,
  channel_id:       Option<String>,
  event_id:         Option<String>,
  parent_event_id:  Option<String>,
  recurrence:       Option<Recurrence>,
  duration_minutes: Option<u32>,
  action_tags:      BTreeSet<ActionTag>,
}

impl Interaction {
  fn bucketed(
    kind: InteractionKind,
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
  ) -> Self {
    Self {
      is_hashed: false,
      timestamp: bucket(timestamp, kind.bucket_size()),
      source,
      target,
      kind,
      channel_id: None,
      event_id: None,
      parent_event_id: None,
      recurrence: None,
      duration_minutes: None,
      action_tags: BTreeSet::new(),
    }
  }

  pub fn create_email(
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
    event_id: Option<String>,
  ) -> Self {
    Self {
      event_id,
      ..Self::bucketed(InteractionKind::Email, timestamp, source, target)
    }
  }

  pub fn create_meeting(
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
    event_id: Option<String>,
    recurrence: Option<Recurrence>,
    duration_minutes: Option<u32>,
  ) -> Self {
    Self {
      event_id,
      recurrence,
      duration_minutes,
      ..Self::bucketed(InteractionKind::Meeting, timestamp, source, target)
    }
  }

  /// `source` started a thread in `channel_id` that `target` took part in.
  pub fn create_chat_thread(
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
    channel_id: impl Into<String>,
    event_id: Option<String>,
  ) -> Self {
    Self::chat(timestamp, source, target, channel_id, ActionTag::Thread)
      .with_events(event_id, None)
  }

  pub fn create_chat_reply(
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
    channel_id: impl Into<String>,
    event_id: Option<String>,
    parent_event_id: Option<String>,
  ) -> Self {
    Self::chat(timestamp, source, target, channel_id, ActionTag::Reply)
      .with_events(event_id, parent_event_id)
  }

  pub fn create_chat_reaction(
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
    channel_id: impl Into<String>,
    event_id: Option<String>,
    parent_event_id: Option<String>,
  ) -> Self {
    Self::chat(timestamp, source, target, channel_id, ActionTag::Reaction)
      .with_events(event_id, parent_event_id)
  }

  fn chat(
    timestamp: DateTime<Utc>,
    source: InteractionEndpoint,
    target: InteractionEndpoint,
    channel_id: impl Into<String>,
    tag: ActionTag,
  ) -> Self {
    Self {
      channel_id: Some(channel_id.into()),
      action_tags: BTreeSet::from([tag]),
      ..Self::bucketed(InteractionKind::Chat, timestamp, source, target)
    }
  }

  fn with_events(
    mut self,
    event_id: Option<String>,
    parent_event_id: Option<String>,
  ) -> Self {
    self.event_id = event_id;
    self.parent_event_id = parent_event_id;
    self
  }

  pub fn is_hashed(&self) -> bool { self.is_hashed }

  pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }

  pub fn source(&self) -> &InteractionEndpoint { &self.source }

  pub fn target(&self) -> &InteractionEndpoint { &self.target }

  pub fn kind(&self) -> InteractionKind { self.kind }

  pub fn channel_id(&self) -> Option<&str> { self.channel_id.as_deref() }

  pub fn event_id(&self) -> Option<&str> { self.event_id.as_deref() }

  pub fn parent_event_id(&self) -> Option<&str> {
    self.parent_event_id.as_deref()
  }

  pub fn recurrence(&self) -> Option<Recurrence> { self.recurrence }

  pub fn duration_minutes(&self) -> Option<u32> { self.duration_minutes }

  pub fn action_tags(&self) -> &BTreeSet<ActionTag> { &self.action_tags }

  /// Hash both endpoints and the channel and event ids. Timestamp, kind,
  /// recurrence, duration and action tags are kept.
  pub fn hash(self, hash: &dyn HashFunction) -> Result<Self> {
    if self.is_hashed {
      return Err(Error::already_hashed(
        HashedEntity::Interaction,
        self.event_id.as_deref().unwrap_or_default(),
      ));
    }
    let hash_opt = |value: Option<String>| {
      value.map(|v| hash_non_empty(hash, &v))
    };
    Ok(Self {
      is_hashed: true,
      source: self.source.hash(hash)?,
      target: self.target.hash(hash)?,
      channel_id: hash_opt(self.channel_id),
      event_id: hash_opt(self.event_id),
      parent_event_id: hash_opt(self.parent_event_id),
      ..self
    })
  }
}

impl PartialEq for Interaction {
  fn eq(&self, other: &Self) -> bool {
    self.timestamp == other.timestamp
      && self.source.id == other.source.id
      && self.target.id == other.target.id
      && self.channel_id == other.channel_id
      && self.kind == other.kind
      && self.action_tags == other.action_tags
  }
}

impl Eq for Interaction {}

impl Hash for Interaction {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.timestamp.hash(state);
    Hash::hash(&self.source.id, state);
    Hash::hash(&self.target.id, state);
    self.channel_id.hash(state);
    self.kind.hash(state);
    self.action_tags.hash(state);
  }
}
