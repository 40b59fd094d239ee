//! [`SqliteStore`] — the SQLite implementation of [`AuditStore`].

use std::path::Path;

use uuid::Uuid;
use vellum_core::store::{AuditStore, EventQuery, StoredEvent};

use crate::{
  Error, Result,
  encode::{RawEvent, encode_data, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An audit-trail store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Null the data column of every record matching `query`, supporting
  /// data-subject erasure. All other columns are never touched. Returns the
  /// number of affected records.
  pub async fn erase_data(&self, query: &EventQuery) -> Result<usize> {
    let (where_clause, params) = filter_clause(query);

    let affected = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE audit_events SET data = NULL {where_clause}"
        );
        Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?)
      })
      .await?;

    tracing::debug!(affected, "erased audit event data");
    Ok(affected)
  }
}

/// Build the conjunctive WHERE clause for `query`'s filter criteria,
/// together with its positional parameters.
fn filter_clause(query: &EventQuery) -> (String, Vec<String>) {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<String> = Vec::new();

  let filters: [(&str, Option<String>); 5] = [
    ("action", query.action.clone()),
    ("source", query.source.map(|s| s.as_str().to_owned())),
    ("subject_type", query.subject_type.clone()),
    ("subject_identifier", query.subject_identifier.clone()),
    ("actor", query.actor.as_ref().map(|a| a.as_str().to_owned())),
  ];
  for (column, value) in filters {
    if let Some(value) = value {
      params.push(value);
      conds.push(format!("{column} = ?{}", params.len()));
    }
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, params)
}

// ─── AuditStore impl ─────────────────────────────────────────────────────────

impl AuditStore for SqliteStore {
  type Error = Error;

  async fn append(&self, record: StoredEvent) -> Result<()> {
    let event_id = Uuid::new_v4().hyphenated().to_string();
    let action = record.action.clone();
    let source = record.source.as_str().to_owned();
    let created_at = encode_dt(record.created_at);
    let subject_type = record.subject_type.clone();
    let subject_identifier = record.subject_identifier.clone();
    let actor = record.actor.as_ref().map(|a| a.as_str().to_owned());
    let impersonator =
      record.impersonator.as_ref().map(|a| a.as_str().to_owned());
    let ip = record.ip.clone();
    let data = record.data.as_ref().map(encode_data);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_events (
             event_id, action, source, created_at,
             subject_type, subject_identifier,
             actor, impersonator, ip, data
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            event_id,
            action,
            source,
            created_at,
            subject_type,
            subject_identifier,
            actor,
            impersonator,
            ip,
            data,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(action = %record.action, "appended audit event");
    Ok(())
  }

  async fn fetch(&self, query: &EventQuery) -> Result<Vec<StoredEvent>> {
    let (where_clause, params) = filter_clause(query);
    // LIMIT -1 is SQLite for "no limit".
    let limit = query.limit.map_or(-1, i64::from);
    let offset = i64::from(query.offset.unwrap_or(0));

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        let sql = format!(
          "SELECT action, source, created_at,
                  subject_type, subject_identifier,
                  actor, impersonator, ip, data
           FROM audit_events
           {where_clause}
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = params
          .into_iter()
          .map(|p| Box::new(p) as Box<dyn rusqlite::types::ToSql>)
          .collect();
        values.push(Box::new(limit));
        values.push(Box::new(offset));

        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), |row| {
            Ok(RawEvent {
              action:             row.get(0)?,
              source:             row.get(1)?,
              created_at:         row.get(2)?,
              subject_type:       row.get(3)?,
              subject_identifier: row.get(4)?,
              actor:              row.get(5)?,
              impersonator:       row.get(6)?,
              ip:                 row.get(7)?,
              data:               row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    tracing::debug!(count = raws.len(), "fetched audit events");
    raws.into_iter().map(RawEvent::into_stored).collect()
  }
}
