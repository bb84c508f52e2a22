//! The `DecisionStore` trait and supporting read-model types.
//!
//! The trait is implemented by storage backends (e.g.
//! `verdict-store-sqlite`). Higher layers (`verdict-api`, `verdict-server`)
//! depend on this abstraction, not on any concrete backend — which also
//! makes substituting a test double trivial.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  decision::{Category, Decision, DecisionPatch, NewDecision, OutcomeUpdate},
  plan::{Page, QueryPlan},
};

// ─── Facet metadata ──────────────────────────────────────────────────────────

/// Inclusive `[min, max]` over all non-null confidence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfidenceRange {
  pub min: u8,
  pub max: u8,
}

/// Outcome lifecycle tallies across the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
  pub total:   usize,
  pub pending: usize,
  pub success: usize,
  pub failed:  usize,
}

/// Facet values for populating filter controls. Always computed over the
/// full decision set, independent of any active filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterMetadata {
  /// Distinct categories in use, in taxonomy order.
  pub categories:       Vec<Category>,
  /// Distinct non-null project names, sorted.
  pub projects:         Vec<String>,
  /// Distinct tags across all decisions, flattened and sorted.
  pub tags:             Vec<String>,
  /// Absent when no decision has a confidence level.
  pub confidence_range: Option<ConfidenceRange>,
  pub outcome_counts:   OutcomeCounts,
}

// ─── Reindex report ──────────────────────────────────────────────────────────

/// Result of a bulk reindex sweep. `stale` counts rows whose stored index
/// did not match the recomputed projection — a consistency warning, never
/// an error. `refreshed` can fall short of `stale` when a concurrent
/// ordinary write rewrites a row mid-sweep; that row is already fresh and
/// is skipped rather than clobbered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
  pub scanned:   usize,
  pub stale:     usize,
  pub refreshed: usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Verdict decision store backend.
///
/// Every write (create, update, outcome) must recompute the derived search
/// index atomically with the field change: after any successful write,
/// the stored index equals the projection of the row's current values.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DecisionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new decision. `id` and both timestamps are set by the store.
  fn create(
    &self,
    input: NewDecision,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + '_;

  /// Retrieve a decision by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Decision>, Self::Error>> + Send + '_;

  /// Apply a partial update and bump `updated_at`.
  /// Fails if the decision does not exist.
  fn update(
    &self,
    id: Uuid,
    patch: DecisionPatch,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + '_;

  /// Record an outcome via the narrower outcome-only path.
  fn record_outcome(
    &self,
    id: Uuid,
    update: OutcomeUpdate,
  ) -> impl Future<Output = Result<Decision, Self::Error>> + Send + '_;

  /// Execute a planned query: predicates ANDed, deterministic sort,
  /// pagination window. Returns the page plus the total match count.
  fn search(
    &self,
    plan: &QueryPlan,
  ) -> impl Future<Output = Result<Page<Decision>, Self::Error>> + Send;

  /// Compute all five facets in one call. The facet queries are
  /// independent and run concurrently; one failure fails the whole call.
  fn metadata(
    &self,
  ) -> impl Future<Output = Result<FilterMetadata, Self::Error>> + Send + '_;

  /// Sweep every row, recompute its index, and rewrite only the rows whose
  /// derived value changed. Idempotent and safely re-runnable.
  fn reindex_all(
    &self,
  ) -> impl Future<Output = Result<ReindexReport, Self::Error>> + Send + '_;
}
