//! Filter validation — untrusted query parameters in, sanitized
//! [`FilterSet`] out.
//!
//! The validator is a pure function over a raw JSON parameter bag. Every
//! field is validated independently and failures are accumulated; callers
//! always get the complete list of problems in one pass, never just the
//! first. Sanitization asymmetries are deliberate and load-bearing:
//! `limit` clamps to the maximum, `offset` floors to zero, while the
//! confidence range rejects outright.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  decision::{Category, sanitize_tags},
  error::FieldError,
};

/// Search terms longer than this (after whitespace normalisation) are
/// rejected.
pub const MAX_SEARCH_LEN: usize = 200;
/// More requested tags than this is rejected.
pub const MAX_TAGS: usize = 20;
pub const DEFAULT_LIMIT: usize = 20;
/// Larger limits are clamped down, never rejected.
pub const MAX_LIMIT: usize = 100;

// ─── Closed filter enums ─────────────────────────────────────────────────────

/// Tri-state outcome classification used for filtering.
/// `Pending` maps to `outcome_success IS NULL` in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
  #[default]
  All,
  Pending,
  Success,
  Failed,
}

impl OutcomeStatus {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Pending => "pending",
      Self::Success => "success",
      Self::Failed => "failed",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "all" => Some(Self::All),
      "pending" => Some(Self::Pending),
      "success" => Some(Self::Success),
      "failed" => Some(Self::Failed),
      _ => None,
    }
  }
}

/// Result ordering. `Relevance` is only meaningful together with a search
/// term; the validator guarantees that coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
  DateDesc,
  DateAsc,
  ConfidenceDesc,
  ConfidenceAsc,
  Relevance,
}

impl SortKey {
  pub const ALL: [Self; 5] = [
    Self::DateDesc,
    Self::DateAsc,
    Self::ConfidenceDesc,
    Self::ConfidenceAsc,
    Self::Relevance,
  ];

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::DateDesc => "date-desc",
      Self::DateAsc => "date-asc",
      Self::ConfidenceDesc => "confidence-desc",
      Self::ConfidenceAsc => "confidence-asc",
      Self::Relevance => "relevance",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.as_str() == s)
  }
}

// ─── FilterSet ───────────────────────────────────────────────────────────────

/// The sanitized, validated form of a client's search/filter request.
/// Request-scoped; built by [`validate_filters`] and consumed by
/// [`crate::plan::QueryPlan::from_filter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSet {
  pub search:         Option<String>,
  pub category:       Option<Category>,
  pub project:        Option<String>,
  pub tags:           Vec<String>,
  pub confidence_min: Option<u8>,
  pub confidence_max: Option<u8>,
  pub outcome_status: OutcomeStatus,
  pub flagged:        Option<bool>,
  pub sort:           SortKey,
  pub limit:          usize,
  pub offset:         usize,
}

impl Default for FilterSet {
  fn default() -> Self {
    Self {
      search:         None,
      category:       None,
      project:        None,
      tags:           Vec::new(),
      confidence_min: None,
      confidence_max: None,
      outcome_status: OutcomeStatus::All,
      flagged:        None,
      sort:           SortKey::DateDesc,
      limit:          DEFAULT_LIMIT,
      offset:         0,
    }
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Validate and sanitize a raw parameter bag into a [`FilterSet`].
///
/// Never short-circuits: every field is checked and all errors are
/// returned together, in field order. No side effects.
pub fn validate_filters(params: &Map<String, Value>) -> Result<FilterSet, Vec<FieldError>> {
  let mut errors = Vec::new();
  let mut filters = FilterSet::default();

  filters.search = validate_search(params.get("search"), &mut errors);
  filters.category = validate_category(params.get("category"), &mut errors);
  filters.project = validate_project(params.get("project"), &mut errors);
  filters.tags = validate_tags(params.get("tags"), &mut errors);
  filters.confidence_min =
    validate_confidence(params.get("confidence_min"), "confidence_min", &mut errors);
  filters.confidence_max =
    validate_confidence(params.get("confidence_max"), "confidence_max", &mut errors);

  if let (Some(min), Some(max)) = (filters.confidence_min, filters.confidence_max)
    && min > max
  {
    errors.push(FieldError::new(
      "confidence_min",
      "confidence_min cannot exceed confidence_max",
    ));
  }

  filters.outcome_status = validate_outcome_status(params.get("outcome_status"), &mut errors);
  filters.flagged = validate_flagged(params.get("flagged"), &mut errors);
  filters.sort = validate_sort(params.get("sort"), filters.search.is_some(), &mut errors);
  filters.limit = validate_limit(params.get("limit"), &mut errors);
  filters.offset = validate_offset(params.get("offset"), &mut errors);

  if errors.is_empty() { Ok(filters) } else { Err(errors) }
}

fn validate_search(value: Option<&Value>, errors: &mut Vec<FieldError>) -> Option<String> {
  let raw = match as_string(value) {
    Ok(s) => s?,
    Err(()) => {
      errors.push(FieldError::new("search", "search must be a string"));
      return None;
    }
  };

  // Collapse internal whitespace runs to single spaces.
  let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
  if normalized.is_empty() {
    return None;
  }
  if normalized.chars().count() > MAX_SEARCH_LEN {
    errors.push(FieldError::new(
      "search",
      format!("search must be at most {MAX_SEARCH_LEN} characters"),
    ));
    return None;
  }
  Some(normalized)
}

fn validate_category(value: Option<&Value>, errors: &mut Vec<FieldError>) -> Option<Category> {
  let raw = match as_string(value) {
    Ok(s) => s?,
    Err(()) => {
      errors.push(FieldError::new("category", "category must be a string"));
      return None;
    }
  };

  match Category::parse(&raw) {
    Some(category) => Some(category),
    None => {
      let valid = Category::ALL.map(Category::as_str).join(", ");
      errors.push(FieldError::new(
        "category",
        format!("category must be one of: {valid}"),
      ));
      None
    }
  }
}

fn validate_project(value: Option<&Value>, errors: &mut Vec<FieldError>) -> Option<String> {
  let raw = match as_string(value) {
    Ok(s) => s?,
    Err(()) => {
      errors.push(FieldError::new("project", "project must be a string"));
      return None;
    }
  };

  let trimmed = raw.trim();
  if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}

fn validate_tags(value: Option<&Value>, errors: &mut Vec<FieldError>) -> Vec<String> {
  let items = match value {
    None | Some(Value::Null) => return Vec::new(),
    Some(Value::Array(items)) => items,
    Some(_) => {
      errors.push(FieldError::new("tags", "tags must be an array of strings"));
      return Vec::new();
    }
  };

  if items.len() > MAX_TAGS {
    errors.push(FieldError::new(
      "tags",
      format!("at most {MAX_TAGS} tags may be requested"),
    ));
    return Vec::new();
  }

  let mut raw = Vec::with_capacity(items.len());
  for item in items {
    match item {
      Value::String(s) => raw.push(s.clone()),
      _ => {
        errors.push(FieldError::new("tags", "every tag must be a string"));
        return Vec::new();
      }
    }
  }

  sanitize_tags(&raw)
}

fn validate_confidence(
  value: Option<&Value>,
  field: &str,
  errors: &mut Vec<FieldError>,
) -> Option<u8> {
  let n = match as_integer(value) {
    Ok(n) => n?,
    Err(()) => {
      errors.push(FieldError::new(
        field,
        format!("{field} must be an integer between 1 and 10"),
      ));
      return None;
    }
  };

  if (1..=10).contains(&n) {
    Some(n as u8)
  } else {
    errors.push(FieldError::new(
      field,
      format!("{field} must be an integer between 1 and 10"),
    ));
    None
  }
}

fn validate_outcome_status(
  value: Option<&Value>,
  errors: &mut Vec<FieldError>,
) -> OutcomeStatus {
  let raw = match as_string(value) {
    Ok(Some(s)) => s,
    Ok(None) => return OutcomeStatus::default(),
    Err(()) => {
      errors.push(FieldError::new(
        "outcome_status",
        "outcome_status must be one of: all, pending, success, failed",
      ));
      return OutcomeStatus::default();
    }
  };

  match OutcomeStatus::parse(&raw) {
    Some(status) => status,
    None => {
      errors.push(FieldError::new(
        "outcome_status",
        "outcome_status must be one of: all, pending, success, failed",
      ));
      OutcomeStatus::default()
    }
  }
}

fn validate_flagged(value: Option<&Value>, errors: &mut Vec<FieldError>) -> Option<bool> {
  match value {
    None | Some(Value::Null) => None,
    Some(Value::Bool(b)) => Some(*b),
    // An empty value means the control was left unset.
    Some(Value::String(s)) if s.trim().is_empty() => None,
    // Query strings arrive as text; coerce the two literals.
    Some(Value::String(s)) if s == "true" => Some(true),
    Some(Value::String(s)) if s == "false" => Some(false),
    Some(_) => {
      errors.push(FieldError::new("flagged", "flagged must be a boolean"));
      None
    }
  }
}

fn validate_sort(
  value: Option<&Value>,
  has_search: bool,
  errors: &mut Vec<FieldError>,
) -> SortKey {
  let default = if has_search { SortKey::Relevance } else { SortKey::DateDesc };

  let raw = match as_string(value) {
    Ok(Some(s)) => s,
    Ok(None) => return default,
    Err(()) => {
      push_sort_error(errors);
      return default;
    }
  };

  match SortKey::parse(&raw) {
    // Explicit relevance without a search term silently falls back to the
    // date default; it is never an error.
    Some(SortKey::Relevance) if !has_search => SortKey::DateDesc,
    Some(key) => key,
    None => {
      push_sort_error(errors);
      default
    }
  }
}

fn push_sort_error(errors: &mut Vec<FieldError>) {
  let valid = SortKey::ALL.map(SortKey::as_str).join(", ");
  errors.push(FieldError::new("sort", format!("sort must be one of: {valid}")));
}

fn validate_limit(value: Option<&Value>, errors: &mut Vec<FieldError>) -> usize {
  let n = match as_integer(value) {
    Ok(Some(n)) => n,
    Ok(None) => return DEFAULT_LIMIT,
    Err(()) => {
      errors.push(FieldError::new("limit", "limit must be a positive integer"));
      return DEFAULT_LIMIT;
    }
  };

  if n < 1 {
    errors.push(FieldError::new("limit", "limit must be a positive integer"));
    DEFAULT_LIMIT
  } else {
    // Oversized limits clamp; they are never rejected.
    (n as usize).min(MAX_LIMIT)
  }
}

fn validate_offset(value: Option<&Value>, errors: &mut Vec<FieldError>) -> usize {
  let n = match as_integer(value) {
    Ok(Some(n)) => n,
    Ok(None) => return 0,
    Err(()) => {
      errors.push(FieldError::new("offset", "offset must be an integer"));
      return 0;
    }
  };

  // Negative offsets floor to zero; unlike the confidence range, this is
  // silently corrected rather than rejected.
  n.max(0) as usize
}

// ─── Wire-value coercion ─────────────────────────────────────────────────────

/// `Ok(None)` — absent, null, or blank. `Err(())` — present but not a
/// string. An unset HTML filter control submits `?field=`, so an
/// empty-after-trim value means "absent", never "invalid".
fn as_string(value: Option<&Value>) -> Result<Option<String>, ()> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
    Some(Value::String(s)) => Ok(Some(s.clone())),
    Some(_) => Err(()),
  }
}

/// Accepts JSON integers and integer-valued strings (the query-string
/// transport delivers everything as text). `Err(())` for floats,
/// non-numeric strings, and other shapes.
fn as_integer(value: Option<&Value>) -> Result<Option<i64>, ()> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Number(n)) => n.as_i64().map(Some).ok_or(()),
    Some(Value::String(s)) if !s.trim().is_empty() => {
      s.trim().parse::<i64>().map(Some).map_err(|_| ())
    }
    Some(Value::String(_)) => Ok(None),
    Some(_) => Err(()),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn bag(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
  }

  #[test]
  fn empty_bag_yields_defaults() {
    let filters = validate_filters(&Map::new()).unwrap();
    assert_eq!(filters, FilterSet::default());
  }

  #[test]
  fn search_is_trimmed_and_whitespace_collapsed() {
    let filters =
      validate_filters(&bag(&[("search", json!("  foo   bar \t baz "))])).unwrap();
    assert_eq!(filters.search.as_deref(), Some("foo bar baz"));
  }

  #[test]
  fn empty_string_values_are_treated_as_absent() {
    // Unset HTML filter controls submit `?field=` for every field at once.
    let filters = validate_filters(&bag(&[
      ("search", json!("")),
      ("category", json!("")),
      ("project", json!("")),
      ("confidence_min", json!("")),
      ("confidence_max", json!("")),
      ("outcome_status", json!("")),
      ("flagged", json!("")),
      ("sort", json!("")),
      ("limit", json!("")),
      ("offset", json!("")),
    ]))
    .unwrap();
    assert_eq!(filters, FilterSet::default());
  }

  #[test]
  fn empty_search_is_treated_as_absent() {
    let filters = validate_filters(&bag(&[("search", json!("   "))])).unwrap();
    assert_eq!(filters.search, None);
    assert_eq!(filters.sort, SortKey::DateDesc);
  }

  #[test]
  fn overlong_search_is_rejected() {
    let errors =
      validate_filters(&bag(&[("search", json!("x".repeat(MAX_SEARCH_LEN + 1)))]))
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "search");
  }

  #[test]
  fn unknown_category_lists_valid_values() {
    let errors = validate_filters(&bag(&[("category", json!("databases"))])).unwrap_err();
    assert_eq!(errors[0].field, "category");
    assert!(errors[0].message.contains("data-storage"));
  }

  #[test]
  fn tags_are_deduplicated_in_first_occurrence_order() {
    let filters = validate_filters(&bag(&[("tags", json!(["x", "x", "y"]))])).unwrap();
    assert_eq!(filters.tags, vec!["x", "y"]);
  }

  #[test]
  fn non_string_tag_element_is_rejected() {
    let errors = validate_filters(&bag(&[("tags", json!(["x", 3]))])).unwrap_err();
    assert_eq!(errors[0].field, "tags");
  }

  #[test]
  fn too_many_tags_is_rejected() {
    let tags: Vec<_> = (0..=MAX_TAGS).map(|i| json!(format!("t{i}"))).collect();
    let errors = validate_filters(&bag(&[("tags", Value::Array(tags))])).unwrap_err();
    assert_eq!(errors[0].field, "tags");
  }

  #[test]
  fn inverted_confidence_range_is_rejected() {
    let errors = validate_filters(&bag(&[
      ("confidence_min", json!(7)),
      ("confidence_max", json!(3)),
    ]))
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("cannot exceed"));
  }

  #[test]
  fn confidence_accepts_stringly_integers() {
    let filters = validate_filters(&bag(&[("confidence_min", json!("4"))])).unwrap();
    assert_eq!(filters.confidence_min, Some(4));
  }

  #[test]
  fn confidence_out_of_range_is_rejected_not_clamped() {
    let errors = validate_filters(&bag(&[("confidence_max", json!(11))])).unwrap_err();
    assert_eq!(errors[0].field, "confidence_max");
  }

  #[test]
  fn flagged_coerces_string_literals() {
    let filters = validate_filters(&bag(&[("flagged", json!("true"))])).unwrap();
    assert_eq!(filters.flagged, Some(true));
    let filters = validate_filters(&bag(&[("flagged", json!(false))])).unwrap();
    assert_eq!(filters.flagged, Some(false));
    let errors = validate_filters(&bag(&[("flagged", json!("yes"))])).unwrap_err();
    assert_eq!(errors[0].field, "flagged");
  }

  #[test]
  fn sort_defaults_to_relevance_when_searching() {
    let filters = validate_filters(&bag(&[("search", json!("cache"))])).unwrap();
    assert_eq!(filters.sort, SortKey::Relevance);
  }

  #[test]
  fn explicit_relevance_without_search_falls_back_silently() {
    let filters = validate_filters(&bag(&[("sort", json!("relevance"))])).unwrap();
    assert_eq!(filters.sort, SortKey::DateDesc);
  }

  #[test]
  fn oversized_limit_clamps_to_max() {
    let filters = validate_filters(&bag(&[("limit", json!(500))])).unwrap();
    assert_eq!(filters.limit, MAX_LIMIT);
  }

  #[test]
  fn zero_limit_is_rejected() {
    let errors = validate_filters(&bag(&[("limit", json!(0))])).unwrap_err();
    assert_eq!(errors[0].field, "limit");
  }

  #[test]
  fn negative_offset_floors_to_zero() {
    let filters = validate_filters(&bag(&[("offset", json!(-5))])).unwrap();
    assert_eq!(filters.offset, 0);
  }

  #[test]
  fn errors_accumulate_across_fields() {
    let errors = validate_filters(&bag(&[
      ("search", json!(42)),
      ("category", json!("nope")),
      ("confidence_min", json!(0)),
      ("limit", json!(-1)),
    ]))
    .unwrap_err();

    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["search", "category", "confidence_min", "limit"]);
  }
}
