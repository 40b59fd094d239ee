//! Error types for `vellum-core`.

use thiserror::Error;

use crate::store::StoredEvent;

#[derive(Debug, Error)]
pub enum Error {
  /// The subject's type is anonymous, or a proxy chain never reached a
  /// concrete type. Anonymous types cannot be referenced in audit events.
  #[error("subject type is not concrete")]
  SubjectNotConcrete,

  /// A resolved identifier value has no canonical string form.
  #[error("cannot convert identifier of type {type_name:?} to a string")]
  IdentifierConversion { type_name: String },

  /// A stored record carries an action tag no registered event type claims.
  #[error("stored record references an unknown audit event type {action:?}")]
  UnknownEventType {
    action: String,
    /// The raw persisted record, kept for diagnostics.
    record: Box<StoredEvent>,
  },

  #[error("{0:?} is neither an IPv4 nor an IPv6 address")]
  InvalidIpAddress(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
