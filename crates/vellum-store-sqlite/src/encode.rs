//! Encoding and decoding helpers between core domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, sources as their lowercase
//! string form, the data payload as compact JSON.

use chrono::{DateTime, Utc};
use vellum_core::{
  context::{ActorId, AuditSource},
  event::EventData,
  store::StoredEvent,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── AuditSource ─────────────────────────────────────────────────────────────

pub fn decode_source(s: &str) -> Result<AuditSource> {
  AuditSource::parse(s).ok_or_else(|| Error::UnknownSource(s.to_owned()))
}

// ─── Data payload ────────────────────────────────────────────────────────────

pub fn encode_data(data: &EventData) -> String {
  serde_json::Value::Object(data.clone()).to_string()
}

pub fn decode_data(s: &str) -> Result<EventData> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings read directly from an `audit_events` row.
pub struct RawEvent {
  pub action:             String,
  pub source:             String,
  pub created_at:         String,
  pub subject_type:       Option<String>,
  pub subject_identifier: Option<String>,
  pub actor:              Option<String>,
  pub impersonator:       Option<String>,
  pub ip:                 Option<String>,
  pub data:               Option<String>,
}

impl RawEvent {
  pub fn into_stored(self) -> Result<StoredEvent> {
    Ok(StoredEvent {
      action:             self.action,
      source:             decode_source(&self.source)?,
      created_at:         decode_dt(&self.created_at)?,
      subject_type:       self.subject_type,
      subject_identifier: self.subject_identifier,
      actor:              self.actor.map(ActorId::new),
      impersonator:       self.impersonator.map(ActorId::new),
      ip:                 self.ip,
      data:               self
        .data
        .as_deref()
        .map(decode_data)
        .transpose()?,
    })
  }
}
