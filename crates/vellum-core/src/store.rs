//! The `AuditStore` trait and the persisted record layout.
//!
//! The trait is implemented by storage backends (e.g.
//! `vellum-store-sqlite`). The layout is storage-engine-agnostic: a backend
//! may flatten it into columns or store it as a document, as long as fetch
//! returns records ordered by `created_at` descending.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  context::{ActorId, AuditSource},
  event::{AuditEvent, EventBody, EventData},
  subject::Subject,
};

// ─── Persisted layout ────────────────────────────────────────────────────────

/// The flattened, persisted form of one audit event.
///
/// `data` may be null even when the event's constructor required it, to
/// support later erasure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
  /// Type tag mapping back to exactly one registered event type.
  pub action:             String,
  pub source:             AuditSource,
  pub created_at:         DateTime<Utc>,
  pub subject_type:       Option<String>,
  pub subject_identifier: Option<String>,
  pub actor:              Option<ActorId>,
  pub impersonator:       Option<ActorId>,
  pub ip:                 Option<String>,
  pub data:               Option<EventData>,
}

impl StoredEvent {
  /// Flatten a live event for storage.
  pub fn from_event(event: &dyn AuditEvent) -> Self {
    let body = event.body();
    let context = body.context();
    Self {
      action:             event.action().to_owned(),
      source:             context.source(),
      created_at:         body.logged_at(),
      subject_type:       body
        .subject()
        .map(|subject| subject.type_name().to_owned()),
      subject_identifier: body
        .subject()
        .and_then(|subject| subject.identifier().map(str::to_owned)),
      actor:              context.actor_id().cloned(),
      impersonator:       context.impersonator_id().cloned(),
      ip:                 context.ip().map(|ip| ip.to_string()),
      data:               body.data().cloned(),
    }
  }

  /// Rebuild the shared event body. Subject fields are trusted verbatim;
  /// the IP is re-validated.
  pub fn into_body(self) -> Result<EventBody> {
    let context = crate::context::Context::from_stored(
      self.source,
      self.actor,
      self.impersonator,
      self.ip.as_deref(),
    )?;
    let subject = self
      .subject_type
      .map(|type_name| {
        Subject::from_stored(type_name, self.subject_identifier)
      });
    Ok(EventBody::from_parts(
      context,
      subject,
      self.created_at,
      self.data,
    ))
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filter criteria for [`AuditStore::fetch`]. All filters are conjunctive;
/// an empty query matches everything.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub action:             Option<String>,
  pub source:             Option<AuditSource>,
  pub subject_type:       Option<String>,
  pub subject_identifier: Option<String>,
  pub actor:              Option<ActorId>,
  /// Maximum number of records; `None` is unbounded.
  pub limit:              Option<u32>,
  /// Records to skip before the first returned one.
  pub offset:             Option<u32>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an audit-trail storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait AuditStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist one record. Records are append-only; nothing ever updates or
  /// deletes them through this trait (data erasure is a host-side concern).
  fn append(
    &self,
    record: StoredEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Matching records, ordered by `created_at` descending.
  fn fetch<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<StoredEvent>, Self::Error>> + Send + 'a;
}

// ─── Tests ───────────────────────────────────────────────────────────────────
