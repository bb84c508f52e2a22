//! Error types for `verdict-core`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single field-scoped validation failure. Validation never stops at the
/// first failure; callers always receive the complete list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field:   field.into(),
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// One or more fields failed validation. Always carries every failure.
  #[error("validation failed: {} field(s)", .0.len())]
  Validation(Vec<FieldError>),

  #[error("decision not found: {0}")]
  DecisionNotFound(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
