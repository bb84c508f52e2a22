//! Query planning — a sanitized [`FilterSet`] becomes an execution plan.
//!
//! The plan is a conjunction of predicates, one sort, and a pagination
//! window. Absent filters contribute no predicate at all (they are not
//! wildcard matches). Invalid filter sets never reach this module; they
//! are rejected upstream by [`crate::filter::validate_filters`].

use serde::Serialize;

use crate::{
  decision::Category,
  filter::{FilterSet, OutcomeStatus, SortKey},
};

// ─── Predicates ──────────────────────────────────────────────────────────────

/// One conjunct of the retrieval predicate. The store backend translates
/// each variant into its native query form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
  /// Free-text match against the derived search index. The term is already
  /// whitespace-normalised by the validator.
  Search(String),
  Category(Category),
  Project(String),
  /// The decision's tag set must contain every requested tag (AND, not OR).
  TagsAll(Vec<String>),
  ConfidenceAtLeast(u8),
  ConfidenceAtMost(u8),
  /// Tri-state outcome match; `None` means pending (`outcome_success` unset).
  OutcomeSuccess(Option<bool>),
  Flagged(bool),
}

// ─── Sort ────────────────────────────────────────────────────────────────────

/// Sort direction for field-ordered plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  Asc,
  Desc,
}

/// The resolved ordering for a plan. Every variant is deterministic: field
/// sorts break ties on creation timestamp descending (then id), and
/// relevance ranks against the active search term with the same tiebreak.
/// Without that, paginated results could duplicate or skip rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortPlan {
  CreatedAt(SortOrder),
  Confidence(SortOrder),
  /// Rank by match quality against the search term.
  Relevance { term: String },
}

// ─── Window ──────────────────────────────────────────────────────────────────

/// The pagination window `[offset, offset + limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub limit:  usize,
  pub offset: usize,
}

// ─── QueryPlan ───────────────────────────────────────────────────────────────

/// The full execution plan handed to the store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
  pub predicates: Vec<Predicate>,
  pub sort:       SortPlan,
  pub window:     Window,
}

impl QueryPlan {
  /// Resolve a sanitized filter set into predicates, sort, and window.
  pub fn from_filter(filters: &FilterSet) -> Self {
    let mut predicates = Vec::new();

    if let Some(term) = &filters.search {
      predicates.push(Predicate::Search(term.clone()));
    }
    if let Some(category) = filters.category {
      predicates.push(Predicate::Category(category));
    }
    if let Some(project) = &filters.project {
      predicates.push(Predicate::Project(project.clone()));
    }
    if !filters.tags.is_empty() {
      predicates.push(Predicate::TagsAll(filters.tags.clone()));
    }
    if let Some(min) = filters.confidence_min {
      predicates.push(Predicate::ConfidenceAtLeast(min));
    }
    if let Some(max) = filters.confidence_max {
      predicates.push(Predicate::ConfidenceAtMost(max));
    }
    match filters.outcome_status {
      OutcomeStatus::All => {}
      OutcomeStatus::Pending => predicates.push(Predicate::OutcomeSuccess(None)),
      OutcomeStatus::Success => predicates.push(Predicate::OutcomeSuccess(Some(true))),
      OutcomeStatus::Failed => predicates.push(Predicate::OutcomeSuccess(Some(false))),
    }
    if let Some(flagged) = filters.flagged {
      predicates.push(Predicate::Flagged(flagged));
    }

    let sort = match (filters.sort, &filters.search) {
      (SortKey::Relevance, Some(term)) => SortPlan::Relevance { term: term.clone() },
      // The validator never emits relevance without a term; if one slips
      // through, fall back to the date default rather than panic.
      (SortKey::Relevance, None) => SortPlan::CreatedAt(SortOrder::Desc),
      (SortKey::DateDesc, _) => SortPlan::CreatedAt(SortOrder::Desc),
      (SortKey::DateAsc, _) => SortPlan::CreatedAt(SortOrder::Asc),
      (SortKey::ConfidenceDesc, _) => SortPlan::Confidence(SortOrder::Desc),
      (SortKey::ConfidenceAsc, _) => SortPlan::Confidence(SortOrder::Asc),
    };

    Self {
      predicates,
      sort,
      window: Window {
        limit:  filters.limit,
        offset: filters.offset,
      },
    }
  }
}

// ─── Result page ─────────────────────────────────────────────────────────────

/// One page of results plus the pagination bookkeeping the client needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items:  Vec<T>,
  /// Total rows matching the predicates, ignoring the window.
  pub total:  usize,
  pub limit:  usize,
  pub offset: usize,
}

impl<T> Page<T> {
  /// `true` iff rows remain beyond this page:
  /// `offset + returned_count < total`.
  pub fn has_more(&self) -> bool {
    self.offset + self.items.len() < self.total
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filter::DEFAULT_LIMIT;

  #[test]
  fn default_filters_produce_no_predicates() {
    let plan = QueryPlan::from_filter(&FilterSet::default());
    assert!(plan.predicates.is_empty());
    assert_eq!(plan.sort, SortPlan::CreatedAt(SortOrder::Desc));
    assert_eq!(plan.window, Window { limit: DEFAULT_LIMIT, offset: 0 });
  }

  #[test]
  fn outcome_status_maps_to_tri_state_predicate() {
    for (status, expected) in [
      (OutcomeStatus::Pending, Some(Predicate::OutcomeSuccess(None))),
      (OutcomeStatus::Success, Some(Predicate::OutcomeSuccess(Some(true)))),
      (OutcomeStatus::Failed, Some(Predicate::OutcomeSuccess(Some(false)))),
      (OutcomeStatus::All, None),
    ] {
      let filters = FilterSet { outcome_status: status, ..FilterSet::default() };
      let plan = QueryPlan::from_filter(&filters);
      assert_eq!(plan.predicates.first().cloned(), expected);
    }
  }

  #[test]
  fn search_with_relevance_sort_carries_the_term() {
    let filters = FilterSet {
      search: Some("cache invalidation".to_owned()),
      sort: SortKey::Relevance,
      ..FilterSet::default()
    };
    let plan = QueryPlan::from_filter(&filters);
    assert_eq!(
      plan.predicates,
      vec![Predicate::Search("cache invalidation".to_owned())]
    );
    assert_eq!(
      plan.sort,
      SortPlan::Relevance { term: "cache invalidation".to_owned() }
    );
  }

  #[test]
  fn tag_filter_is_a_single_superset_predicate() {
    let filters = FilterSet {
      tags: vec!["a".to_owned(), "b".to_owned()],
      ..FilterSet::default()
    };
    let plan = QueryPlan::from_filter(&filters);
    assert_eq!(
      plan.predicates,
      vec![Predicate::TagsAll(vec!["a".to_owned(), "b".to_owned()])]
    );
  }

  #[test]
  fn has_more_boundary_cases() {
    let page = |count: usize, total: usize, offset: usize| Page {
      items: vec![(); count],
      total,
      limit: 20,
      offset,
    };

    assert!(page(20, 25, 0).has_more());
    assert!(!page(5, 25, 20).has_more());
    // Exact boundary: offset + limit == total.
    assert!(!page(20, 20, 0).has_more());
    assert!(!page(0, 0, 0).has_more());
  }
}
