//! SQL schema for the Vellum SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Audit events are append-only. The only UPDATE ever issued against this
-- table is the data-erasure statement, which nulls the data column.
CREATE TABLE IF NOT EXISTS audit_events (
    event_id           TEXT PRIMARY KEY,
    action             TEXT NOT NULL,   -- tag of the registered event type
    source             TEXT NOT NULL,   -- 'console' | 'ui' | 'api' | 'webhook' | 'job' | 'unknown'
    created_at         TEXT NOT NULL,   -- ISO 8601 UTC
    subject_type       TEXT,
    subject_identifier TEXT,
    actor              TEXT,
    impersonator       TEXT,
    ip                 TEXT,            -- at most 39 chars (full IPv6)
    data               TEXT             -- JSON object or NULL after erasure
);

CREATE INDEX IF NOT EXISTS audit_events_action_idx   ON audit_events(action);
CREATE INDEX IF NOT EXISTS audit_events_created_idx  ON audit_events(created_at);
CREATE INDEX IF NOT EXISTS audit_events_subject_idx  ON audit_events(subject_type, subject_identifier);

PRAGMA user_version = 1;
";
