//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use vellum_core::{
  context::{ActorId, AuditSource},
  event::{AuditEvent, EventBody, EventRegistry, RegisteredEvent},
  presenter::Presenter,
  store::{AuditStore, EventQuery, StoredEvent},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(action: &str, source: AuditSource, seq: i64) -> StoredEvent {
  let mut data = serde_json::Map::new();
  data.insert("seq".into(), seq.into());
  StoredEvent {
    action:             action.to_owned(),
    source,
    created_at:         Utc::now() + Duration::seconds(seq),
    subject_type:       Some("Widget".into()),
    subject_identifier: Some(seq.to_string()),
    actor:              Some(ActorId::from("alice")),
    impersonator:       None,
    ip:                 Some("::1".into()),
    data:               Some(data),
  }
}

// ─── Append / fetch ──────────────────────────────────────────────────────────

#[tokio::test]
async fn append_and_fetch_round_trip() {
  let s = store().await;
  let original = record("widget_created", AuditSource::Ui, 1);
  s.append(original.clone()).await.unwrap();

  let fetched = s.fetch(&EventQuery::default()).await.unwrap();
  assert_eq!(fetched.len(), 1);
  assert_eq!(fetched[0].action, original.action);
  assert_eq!(fetched[0].source, AuditSource::Ui);
  assert_eq!(fetched[0].subject_identifier.as_deref(), Some("1"));
  assert_eq!(
    fetched[0].actor.as_ref().map(ActorId::as_str),
    Some("alice")
  );
  assert_eq!(fetched[0].ip.as_deref(), Some("::1"));
  assert_eq!(
    fetched[0].data.as_ref().and_then(|d| d.get("seq")),
    Some(&serde_json::json!(1))
  );
}

#[tokio::test]
async fn fetch_orders_newest_first() {
  let s = store().await;
  for seq in 0..5 {
    s.append(record("tick", AuditSource::Job, seq)).await.unwrap();
  }

  let fetched = s.fetch(&EventQuery::default()).await.unwrap();
  let seqs: Vec<&str> = fetched
    .iter()
    .filter_map(|r| r.subject_identifier.as_deref())
    .collect();
  assert_eq!(seqs, ["4", "3", "2", "1", "0"]);
}

#[tokio::test]
async fn fetch_filters_are_conjunctive() {
  let s = store().await;
  s.append(record("widget_created", AuditSource::Ui, 1)).await.unwrap();
  s.append(record("widget_created", AuditSource::Api, 2)).await.unwrap();
  s.append(record("widget_deleted", AuditSource::Api, 3)).await.unwrap();

  let query = EventQuery {
    action: Some("widget_created".into()),
    source: Some(AuditSource::Api),
    ..EventQuery::default()
  };
  let fetched = s.fetch(&query).await.unwrap();
  assert_eq!(fetched.len(), 1);
  assert_eq!(fetched[0].subject_identifier.as_deref(), Some("2"));
}

#[tokio::test]
async fn fetch_filters_by_subject_and_actor() {
  let s = store().await;
  s.append(record("widget_created", AuditSource::Ui, 1)).await.unwrap();
  let mut other = record("widget_created", AuditSource::Ui, 2);
  other.actor = Some(ActorId::from("bob"));
  s.append(other).await.unwrap();

  let query = EventQuery {
    subject_type: Some("Widget".into()),
    actor: Some(ActorId::from("bob")),
    ..EventQuery::default()
  };
  let fetched = s.fetch(&query).await.unwrap();
  assert_eq!(fetched.len(), 1);
  assert_eq!(fetched[0].subject_identifier.as_deref(), Some("2"));
}

#[tokio::test]
async fn limit_and_offset_page_through_results() {
  let s = store().await;
  for seq in 0..30 {
    s.append(record("tick", AuditSource::Job, seq)).await.unwrap();
  }

  let query = EventQuery {
    limit: Some(10),
    offset: Some(10),
    ..EventQuery::default()
  };
  let fetched = s.fetch(&query).await.unwrap();
  let seqs: Vec<String> = fetched
    .iter()
    .filter_map(|r| r.subject_identifier.clone())
    .collect();
  let expected: Vec<String> =
    (10..=19).rev().map(|n: i64| n.to_string()).collect();
  assert_eq!(seqs, expected);
}

// ─── Erasure ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn erase_data_nulls_only_matching_payloads() {
  let s = store().await;
  s.append(record("widget_created", AuditSource::Ui, 1)).await.unwrap();
  s.append(record("widget_deleted", AuditSource::Ui, 2)).await.unwrap();

  let affected = s
    .erase_data(&EventQuery {
      action: Some("widget_created".into()),
      ..EventQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(affected, 1);

  let fetched = s.fetch(&EventQuery::default()).await.unwrap();
  let erased = fetched
    .iter()
    .find(|r| r.action == "widget_created")
    .unwrap();
  let kept = fetched
    .iter()
    .find(|r| r.action == "widget_deleted")
    .unwrap();
  assert!(erased.data.is_none());
  assert!(kept.data.is_some());
  // Everything but the payload survives erasure.
  assert_eq!(erased.subject_identifier.as_deref(), Some("1"));
}

// ─── Presenter over SQLite ───────────────────────────────────────────────────

#[derive(Debug)]
struct Tick {
  body: EventBody,
}

impl AuditEvent for Tick {
  fn action(&self) -> &'static str {
    Self::ACTION
  }

  fn message(&self) -> &str {
    "tick"
  }

  fn parameters(&self) -> BTreeMap<String, String> {
    BTreeMap::new()
  }

  fn body(&self) -> &EventBody {
    &self.body
  }
}

impl RegisteredEvent for Tick {
  const ACTION: &'static str = "tick";

  fn from_body(body: EventBody) -> Self {
    Self { body }
  }
}

#[tokio::test]
async fn presenter_pages_rehydrated_events() {
  let s = store().await;
  for seq in 0..25 {
    s.append(record("tick", AuditSource::Job, seq)).await.unwrap();
  }

  let mut registry = EventRegistry::new();
  registry.register::<Tick>();
  let presenter = Presenter::new(s, registry);

  let events: Vec<_> = presenter
    .fetch(EventQuery::default(), Some(2), 10)
    .await
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();
  assert_eq!(events.len(), 10);
  assert_eq!(
    events[0].body().subject().and_then(|s| s.identifier()),
    Some("14")
  );
  assert_eq!(
    events[9].body().subject().and_then(|s| s.identifier()),
    Some("5")
  );
}

#[tokio::test]
async fn presenter_surfaces_unknown_tags_lazily() {
  let s = store().await;
  s.append(record("tick", AuditSource::Job, 1)).await.unwrap();
  s.append(record("untracked", AuditSource::Job, 2)).await.unwrap();

  let mut registry = EventRegistry::new();
  registry.register::<Tick>();
  let presenter = Presenter::new(s, registry);

  let mut events = presenter
    .fetch(EventQuery::default(), None, 50)
    .await
    .unwrap();

  // Newest first: the unregistered record comes out first and fails.
  let first = events.next().unwrap();
  assert!(matches!(
    first.unwrap_err(),
    vellum_core::Error::UnknownEventType { .. }
  ));
  let second = events.next().unwrap().unwrap();
  assert_eq!(second.action(), "tick");
}
