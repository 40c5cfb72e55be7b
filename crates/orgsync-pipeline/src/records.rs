//! Flat, already-deserialized connector records and the dataset produced
//! from them.
//!
//! Connectors (chat, email, calendar, HR export) hand over these shapes; the
//! pipeline maps them onto the core factories. Every identifier field accepts
//! any alias the directory may know (email, username, data-source id).

use std::{
  collections::BTreeMap,
  io::{Read, Write},
};

use chrono::{DateTime, Utc};
use orgsync_core::{Employee, Interaction, interaction::Recurrence};
use serde::{Deserialize, Serialize};

use crate::Result;

// ─── Input ───────────────────────────────────────────────────────────────────

/// One person or bot from an HR export or connector directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
  /// Primary id, usually the work email.
  pub id:         String,
  /// Id of the person in the originating data source.
  #[serde(default)]
  pub source_id:  String,
  #[serde(default)]
  pub aliases:    Vec<String>,
  #[serde(default)]
  pub is_bot:     bool,
  #[serde(default)]
  pub groups:     Vec<GroupRecord>,
  /// Any alias of the employee this one reports to.
  #[serde(default)]
  pub manager:    Option<String>,
  #[serde(default)]
  pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
  pub id:        String,
  pub name:      String,
  pub category:  String,
  #[serde(default)]
  pub parent_id: Option<String>,
}

/// One raw communication event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionRecord {
  /// Fans out to one interaction per recipient.
  Email {
    timestamp:  DateTime<Utc>,
    from:       String,
    to:         Vec<String>,
    #[serde(default)]
    message_id: Option<String>,
  },
  /// Fans out from the organizer to every attendee.
  Meeting {
    timestamp:        DateTime<Utc>,
    organizer:        String,
    attendees:        Vec<String>,
    #[serde(default)]
    event_id:         Option<String>,
    #[serde(default)]
    recurrence:       Option<Recurrence>,
    #[serde(default)]
    duration_minutes: Option<u32>,
  },
  ChatThread {
    timestamp:  DateTime<Utc>,
    from:       String,
    to:         String,
    channel_id: String,
    #[serde(default)]
    event_id:   Option<String>,
  },
  ChatReply {
    timestamp:       DateTime<Utc>,
    from:            String,
    to:              String,
    channel_id:      String,
    #[serde(default)]
    event_id:        Option<String>,
    #[serde(default)]
    parent_event_id: Option<String>,
  },
  ChatReaction {
    timestamp:       DateTime<Utc>,
    from:            String,
    to:              String,
    channel_id:      String,
    #[serde(default)]
    event_id:        Option<String>,
    #[serde(default)]
    parent_event_id: Option<String>,
  },
}

impl InteractionRecord {
  /// The alias on the originating side of every edge this record yields.
  pub fn source(&self) -> &str {
    match self {
      Self::Email { from, .. }
      | Self::ChatThread { from, .. }
      | Self::ChatReply { from, .. }
      | Self::ChatReaction { from, .. } => from.as_str(),
      Self::Meeting { organizer, .. } => organizer.as_str(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncInput {
  #[serde(default)]
  pub employees:    Vec<EmployeeRecord>,
  #[serde(default)]
  pub interactions: Vec<InteractionRecord>,
}

impl SyncInput {
  pub fn from_reader(reader: impl Read) -> Result<Self> {
    Ok(serde_json::from_reader(reader)?)
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// The canonical dataset for the upload client.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutput {
  pub employees:    Vec<Employee>,
  pub interactions: Vec<Interaction>,
}

impl SyncOutput {
  pub fn to_writer(&self, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, self)?;
    writer.write_all(b"\n")?;
    Ok(())
  }
}
