//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Mapping: batched validation failures → 400 with the full `{field,
//! message}` list; not-found → 404; anything from the store → 500 with a
//! generic message (the real failure goes to the log, never the client).

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use verdict_core::FieldError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Field-scoped validation failures, always the complete batch.
  #[error("validation failed: {} field(s)", .0.len())]
  Validation(Vec<FieldError>),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  const fn status(&self) -> StatusCode {
    match self {
      Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  const fn code(&self) -> &'static str {
    match self {
      Self::Validation(_) => "VALIDATION_ERROR",
      Self::BadRequest(_) => "BAD_REQUEST",
      Self::NotFound(_) => "NOT_FOUND",
      Self::Store(_) => "INTERNAL_ERROR",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let code = self.code();

    let error = match &self {
      ApiError::Validation(details) => json!({
        "message": "validation failed",
        "code":    code,
        "details": details,
      }),
      ApiError::BadRequest(message) | ApiError::NotFound(message) => json!({
        "message": message,
        "code":    code,
      }),
      ApiError::Store(source) => {
        tracing::error!(error = %source, "store failure");
        json!({
          "message": "an internal error occurred",
          "code":    code,
        })
      }
    };

    let body = json!({
      "success":   false,
      "error":     error,
      "timestamp": Utc::now(),
    });
    (status, Json(body)).into_response()
  }
}
