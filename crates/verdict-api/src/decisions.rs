//! Handlers for the `/decisions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/decisions` | Filtered, sorted, paginated list + facet metadata |
//! | `POST` | `/decisions` | Body: [`NewDecision`]; returns 201 + stored decision |
//! | `GET`  | `/decisions/:id` | 404 if not found |
//! | `PUT`  | `/decisions/:id` | Body: [`DecisionPatch`]; partial update |
//! | `POST` | `/decisions/:id/outcome` | Body: [`OutcomeUpdate`] |
//! | `POST` | `/reindex` | Bulk reindex sweep; returns the report |

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde_json::{Map, Value};
use uuid::Uuid;
use verdict_core::{
  decision::{Decision, DecisionPatch, NewDecision, OutcomeUpdate},
  filter::validate_filters,
  plan::QueryPlan,
  store::{DecisionStore, ReindexReport},
};

use crate::{
  envelope::{DecisionList, Envelope},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// Convert raw query parameters into the validator's parameter bag.
/// `tags` arrives comma-separated on the wire; splitting it here keeps the
/// comma syntax a transport detail the validator never sees.
fn param_bag(params: HashMap<String, String>) -> Map<String, Value> {
  params
    .into_iter()
    .map(|(key, value)| {
      let value = if key == "tags" {
        Value::Array(value.split(',').map(|t| Value::String(t.to_owned())).collect())
      } else {
        Value::String(value)
      };
      (key, value)
    })
    .collect()
}

/// `GET /decisions[?search=...][&category=...][&tags=a,b][&sort=...][&limit=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Envelope<DecisionList>>, ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filters = validate_filters(&param_bag(params)).map_err(ApiError::Validation)?;
  let plan = QueryPlan::from_filter(&filters);

  // The page and the facet block are independent reads; fetch them
  // concurrently and fail the request if either fails.
  let (page, metadata) = tokio::try_join!(
    async {
      store
        .search(&plan)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))
    },
    async {
      store
        .metadata()
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))
    },
  )?;

  Ok(Json(Envelope::ok(DecisionList::from_parts(page, metadata))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /decisions/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Decision>>, ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let decision = store
    .get(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("decision {id} not found")))?;
  Ok(Json(Envelope::ok(decision)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /decisions` — returns 201 + the stored [`Decision`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewDecision>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  body.validate().map_err(ApiError::Validation)?;

  let decision = store
    .create(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(Envelope::ok(decision))))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /decisions/:id` — body is a [`DecisionPatch`]; absent fields are
/// left unchanged.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DecisionPatch>,
) -> Result<Json<Envelope<Decision>>, ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  body.validate().map_err(ApiError::Validation)?;
  ensure_exists(store.as_ref(), id).await?;

  let decision = store
    .update(id, body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(Envelope::ok(decision)))
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// `POST /decisions/:id/outcome` — record the outcome via the narrow path.
pub async fn record_outcome<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<OutcomeUpdate>,
) -> Result<Json<Envelope<Decision>>, ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  body.validate().map_err(ApiError::Validation)?;
  ensure_exists(store.as_ref(), id).await?;

  let decision = store
    .record_outcome(id, body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(Envelope::ok(decision)))
}

// ─── Reindex ──────────────────────────────────────────────────────────────────

/// `POST /reindex` — sweep every row and refresh stale derived indexes.
pub async fn reindex<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Envelope<ReindexReport>>, ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let report = store
    .reindex_all()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(Envelope::ok(report)))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// 404 before mutating, so a missing id is reported as not-found rather
/// than surfacing as a backend-specific error.
async fn ensure_exists<S>(store: &S, id: Uuid) -> Result<(), ApiError>
where
  S: DecisionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("decision {id} not found")))?;
  Ok(())
}
