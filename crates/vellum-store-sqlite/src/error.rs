//! Error type for `vellum-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vellum_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored `source` column holds a string no [`AuditSource`] variant
  /// claims.
  ///
  /// [`AuditSource`]: vellum_core::context::AuditSource
  #[error("unknown audit source: {0:?}")]
  UnknownSource(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
