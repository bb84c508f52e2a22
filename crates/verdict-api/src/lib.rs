//! JSON REST API for Verdict.
//!
//! Exposes an axum [`Router`] backed by any
//! [`verdict_core::store::DecisionStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", verdict_api::api_router(store.clone()))
//! ```

pub mod decisions;
pub mod envelope;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use verdict_core::store::DecisionStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DecisionStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route(
      "/decisions",
      get(decisions::list::<S>).post(decisions::create::<S>),
    )
    .route(
      "/decisions/{id}",
      get(decisions::get_one::<S>).put(decisions::update::<S>),
    )
    .route("/decisions/{id}/outcome", post(decisions::record_outcome::<S>))
    .route("/reindex", post(decisions::reindex::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use http_body_util::BodyExt as _;
  use serde_json::{Value, json};
  use tower::util::ServiceExt as _;
  use verdict_store_sqlite::SqliteStore;

  use super::*;

  async fn router() -> Router<()> {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    api_router(Arc::new(store))
  }

  async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn create_body() -> Value {
    json!({
      "title": "Adopt SQLite",
      "category": "data-storage",
      "business_context": "Single-user tool",
      "problem_statement": "Need durable storage",
      "chosen_option": "SQLite",
      "reasoning": "Zero-ops embedded database",
      "tags": ["storage"],
      "confidence_level": 8
    })
  }

  #[tokio::test]
  async fn list_on_empty_store_returns_envelope() {
    let response = router()
      .await
      .oneshot(Request::get("/decisions").body(Body::empty()).unwrap())
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["decisions"], json!([]));
    assert_eq!(body["data"]["total"], json!(0));
    assert_eq!(body["data"]["hasMore"], json!(false));
    assert_eq!(body["data"]["metadata"]["categories"], json!([]));
    assert!(body["timestamp"].is_string());
  }

  #[tokio::test]
  async fn invalid_filters_return_the_full_error_batch() {
    let response = router()
      .await
      .oneshot(
        Request::get("/decisions?category=nope&confidence_min=12&limit=0")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));

    let details = body["error"]["details"].as_array().unwrap();
    let fields: Vec<_> = details.iter().map(|d| d["field"].as_str().unwrap()).collect();
    assert_eq!(fields, vec!["category", "confidence_min", "limit"]);
  }

  #[tokio::test]
  async fn create_then_search_round_trip() {
    let app = router().await;

    let response = app
      .clone()
      .oneshot(
        Request::post("/decisions")
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(create_body().to_string()))
          .unwrap(),
      )
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_owned();

    let response = app
      .clone()
      .oneshot(
        Request::get("/decisions?search=durable")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], json!(1));
    assert_eq!(body["data"]["decisions"][0]["id"], json!(id));

    let response = app
      .oneshot(
        Request::get(format!("/decisions/{id}").as_str())
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_decision_is_404_with_error_envelope() {
    let response = router()
      .await
      .oneshot(
        Request::get("/decisions/00000000-0000-0000-0000-000000000000")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
  }
}
