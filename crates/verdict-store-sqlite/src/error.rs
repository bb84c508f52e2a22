//! Error type for `verdict-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] verdict_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum label no longer maps to a known variant.
  #[error("unknown {kind} label: {value:?}")]
  UnknownLabel { kind: &'static str, value: String },

  /// Attempted to update or record an outcome for a missing decision.
  #[error("decision not found: {0}")]
  DecisionNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
