//! Audit events — the polymorphic family of concrete audit-event types.
//!
//! Each concrete event type defines a stable action tag, a message key and
//! structured translation parameters, and composes the shared [`EventBody`]
//! (context, subject, timestamp, payload). Event types are meant to be built
//! through static, named constructors that take domain-specific arguments
//! and encode the subject internally; the body is an implementation detail,
//! not something the caller assembles.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::{
  Error, Result, context::Context, store::StoredEvent, subject::Subject,
};

/// The JSON-object payload stored with an event. Must stay JSON-serializable;
/// no nested domain objects or resources.
pub type EventData = serde_json::Map<String, serde_json::Value>;

// ─── EventBody ───────────────────────────────────────────────────────────────

/// The shared, immutable payload every audit event carries.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBody {
  context:   Context,
  subject:   Option<Subject>,
  logged_at: DateTime<Utc>,
  data:      Option<EventData>,
}

impl EventBody {
  /// Build a body for a freshly observed action, stamped with the current
  /// time.
  pub fn new(
    context: Context,
    subject: Option<Subject>,
    data: EventData,
  ) -> Self {
    Self { context, subject, logged_at: Utc::now(), data: Some(data) }
  }

  /// Rebuild a body from persisted parts. `data` may be absent even when the
  /// variant's constructor required it; erasure can have removed it since.
  pub fn from_parts(
    context: Context,
    subject: Option<Subject>,
    logged_at: DateTime<Utc>,
    data: Option<EventData>,
  ) -> Self {
    Self { context, subject, logged_at, data }
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn subject(&self) -> Option<&Subject> {
    self.subject.as_ref()
  }

  pub fn logged_at(&self) -> DateTime<Utc> {
    self.logged_at
  }

  pub fn data(&self) -> Option<&EventData> {
    self.data.as_ref()
  }

  /// Drop the data payload. The only permitted post-hoc mutation, supporting
  /// data-subject erasure; every other field stays populated for good.
  pub fn erase_data(&mut self) {
    self.data = None;
  }
}

// ─── Event trait ─────────────────────────────────────────────────────────────

/// An additional piece of information complementing the main audit message:
/// either a literal display string or a translation key with parameters.
/// Keyed entries are namespaced under the extra-info namespace plus the
/// event's message key at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoEntry {
  Literal(String),
  Keyed {
    key:        String,
    parameters: BTreeMap<String, String>,
  },
}

/// A concrete audit event.
pub trait AuditEvent: std::fmt::Debug + Send + Sync {
  /// Stable type tag stored with the record; must map back to exactly one
  /// event type through the [`EventRegistry`].
  fn action(&self) -> &'static str;

  /// Dotted translation key for the primary message.
  fn message(&self) -> &str;

  /// Flat translation parameters for the primary message.
  fn parameters(&self) -> BTreeMap<String, String>;

  /// Additional info entries; empty for most events.
  fn info(&self) -> Vec<InfoEntry> {
    Vec::new()
  }

  fn body(&self) -> &EventBody;
}

/// An event type that can be re-hydrated from storage.
pub trait RegisteredEvent: AuditEvent + Sized {
  /// The tag this type claims; `action()` must return the same string.
  const ACTION: &'static str;

  /// Rebuild the event from a stored body; the inverse of flattening into a
  /// [`StoredEvent`].
  fn from_body(body: EventBody) -> Self;
}

// ─── Registry ────────────────────────────────────────────────────────────────

type EventFactory = fn(EventBody) -> Box<dyn AuditEvent>;

/// The action-tag → constructor table used to re-hydrate stored records.
/// Populated once at startup; a lookup miss during re-hydration is an error,
/// never a silent default.
#[derive(Default)]
pub struct EventRegistry {
  factories: HashMap<&'static str, EventFactory>,
}

impl EventRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an event type under its action tag. Registering the same tag
  /// twice keeps the latest factory.
  pub fn register<E: RegisteredEvent + 'static>(&mut self) {
    self
      .factories
      .insert(E::ACTION, |body| Box::new(E::from_body(body)));
  }

  pub fn contains(&self, action: &str) -> bool {
    self.factories.contains_key(action)
  }

  /// Dispatch a stored record to the matching event type.
  pub fn rehydrate(&self, record: StoredEvent) -> Result<Box<dyn AuditEvent>> {
    let Some(factory) = self.factories.get(record.action.as_str()) else {
      return Err(Error::UnknownEventType {
        action: record.action.clone(),
        record: Box::new(record),
      });
    };
    Ok(factory(record.into_body()?))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::Utc;

  use super::{
    AuditEvent, EventBody, EventData, EventRegistry, InfoEntry,
    RegisteredEvent,
  };
  use crate::{
    Error,
    context::Context,
    store::StoredEvent,
    subject::Subject,
  };

  #[derive(Debug)]
  struct WidgetCreated {
    body: EventBody,
  }

  impl WidgetCreated {
    fn create(context: Context, subject: Subject) -> Self {
      let mut data = EventData::new();
      data.insert("kind".into(), "widget".into());
      Self { body: EventBody::new(context, Some(subject), data) }
    }
  }

  impl AuditEvent for WidgetCreated {
    fn action(&self) -> &'static str {
      Self::ACTION
    }

    fn message(&self) -> &str {
      "widget.created"
    }

    fn parameters(&self) -> BTreeMap<String, String> {
      BTreeMap::from([("kind".to_owned(), "widget".to_owned())])
    }

    fn info(&self) -> Vec<InfoEntry> {
      vec![InfoEntry::Literal("made by hand".into())]
    }

    fn body(&self) -> &EventBody {
      &self.body
    }
  }

  impl RegisteredEvent for WidgetCreated {
    const ACTION: &'static str = "widget_created";

    fn from_body(body: EventBody) -> Self {
      Self { body }
    }
  }

  fn stored(action: &str) -> StoredEvent {
    StoredEvent {
      action:             action.to_owned(),
      source:             crate::context::AuditSource::Console,
      created_at:         Utc::now(),
      subject_type:       Some("Widget".into()),
      subject_identifier: Some("42".into()),
      actor:              None,
      impersonator:       None,
      ip:                 None,
      data:               None,
    }
  }

  #[test]
  fn registered_tag_rehydrates() {
    let mut registry = EventRegistry::new();
    registry.register::<WidgetCreated>();

    let event = registry.rehydrate(stored("widget_created")).unwrap();
    assert_eq!(event.action(), "widget_created");
    let subject = event.body().subject().unwrap();
    assert_eq!(subject.type_name(), "Widget");
    assert_eq!(subject.identifier(), Some("42"));
    // Erased data stays absent after re-hydration.
    assert!(event.body().data().is_none());
  }

  #[test]
  fn unknown_tag_fails_with_the_raw_record() {
    let registry = EventRegistry::new();
    let err = registry.rehydrate(stored("widget_created")).unwrap_err();
    match err {
      Error::UnknownEventType { action, record } => {
        assert_eq!(action, "widget_created");
        assert_eq!(record.subject_identifier.as_deref(), Some("42"));
      }
      other => panic!("expected unknown event type, got {other:?}"),
    }
  }

  #[test]
  fn erase_data_clears_only_the_payload() {
    let mut body = WidgetCreated::create(
      Context::console(),
      Subject::from_stored("Widget", Some("42".into())),
    )
    .body;
    assert!(body.data().is_some());

    body.erase_data();
    assert!(body.data().is_none());
    assert!(body.subject().is_some());
  }
}
