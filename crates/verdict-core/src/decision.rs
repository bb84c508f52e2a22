//! Decision types — the fundamental unit of the Verdict log.
//!
//! A decision is recorded once with its context and rationale, then amended
//! over time: partial field updates, review flags, and an optional
//! later-recorded outcome. The derived search index lives in the store, not
//! here — it is never client-writable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldError;

/// Titles longer than this are rejected on create and update.
pub const MAX_TITLE_LEN: usize = 200;

// ─── Classification enums ────────────────────────────────────────────────────

/// The fixed category taxonomy. One shared enum feeds the validator, the
/// planner, the store encoding, and response serialization, so the
/// accepted-values list cannot drift from the actual type.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
  Architecture,
  DataStorage,
  ApiDesign,
  Infrastructure,
  Security,
  Performance,
  Testing,
  Tooling,
  Process,
  Other,
}

impl Category {
  pub const ALL: [Self; 10] = [
    Self::Architecture,
    Self::DataStorage,
    Self::ApiDesign,
    Self::Infrastructure,
    Self::Security,
    Self::Performance,
    Self::Testing,
    Self::Tooling,
    Self::Process,
    Self::Other,
  ];

  /// The wire/storage label. Must match the serde `kebab-case` renames.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Architecture => "architecture",
      Self::DataStorage => "data-storage",
      Self::ApiDesign => "api-design",
      Self::Infrastructure => "infrastructure",
      Self::Security => "security",
      Self::Performance => "performance",
      Self::Testing => "testing",
      Self::Tooling => "tooling",
      Self::Process => "process",
      Self::Other => "other",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.as_str() == s)
  }
}

/// How reversible the decision is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionType {
  Reversible,
  Irreversible,
  Experiment,
}

impl DecisionType {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Reversible => "reversible",
      Self::Irreversible => "irreversible",
      Self::Experiment => "experiment",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "reversible" => Some(Self::Reversible),
      "irreversible" => Some(Self::Irreversible),
      "experiment" => Some(Self::Experiment),
      _ => None,
    }
  }
}

/// A dimension the decision deliberately optimises for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
  Speed,
  Cost,
  Reliability,
  Simplicity,
  Security,
}

// ─── Structured sub-types ────────────────────────────────────────────────────

/// An alternative that was weighed before the chosen option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsideredOption {
  pub name:        String,
  pub description: String,
  #[serde(default)]
  pub pros:        Vec<String>,
  #[serde(default)]
  pub cons:        Vec<String>,
}

/// A note comparing this decision to a related one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityNote {
  pub related_id: Uuid,
  pub reason:     String,
  pub comparison: String,
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// A logged decision. Identity and timestamps are system-owned; the derived
/// search index is store-owned and intentionally absent from this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
  pub id:         Uuid,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  /// Bumped by the store on every field update.
  pub updated_at: DateTime<Utc>,

  // ── Classification ──────────────────────────────────────────────────────
  pub title:    String,
  pub category: Category,
  pub project:  Option<String>,
  /// Insertion order preserved for display; set semantics for filtering.
  pub tags:     Vec<String>,

  // ── Narrative ───────────────────────────────────────────────────────────
  pub business_context:  String,
  pub problem_statement: String,
  pub chosen_option:     String,
  pub reasoning:         String,
  pub notes:             Option<String>,

  // ── Metadata ────────────────────────────────────────────────────────────
  /// 1–10 when present.
  pub confidence_level:   Option<u8>,
  pub decision_type:      Option<DecisionType>,
  pub considered_options: Vec<ConsideredOption>,

  // ── Tradeoffs ───────────────────────────────────────────────────────────
  pub tradeoffs_accepted: Vec<String>,
  pub tradeoffs_rejected: Vec<String>,
  pub optimized_for:      Vec<Dimension>,

  // ── Review lifecycle ────────────────────────────────────────────────────
  pub flagged_for_review: bool,
  pub next_review_date:   Option<NaiveDate>,
  pub revisit_reason:     Option<String>,

  // ── Outcome lifecycle — all null until explicitly recorded ─────────────
  pub outcome:         Option<String>,
  pub outcome_date:    Option<NaiveDate>,
  /// Tri-state: `Some(true)` success, `Some(false)` failed, `None` pending.
  pub outcome_success: Option<bool>,
  pub lessons_learned: Option<String>,

  // ── Relationships ───────────────────────────────────────────────────────
  pub related_decisions: Vec<Uuid>,
  pub similarity_notes:  Vec<SimilarityNote>,
}

impl Decision {
  /// Apply a partial update. `None` fields are left unchanged.
  /// Timestamps are not touched here; the store owns them.
  pub fn apply_patch(&mut self, patch: DecisionPatch) {
    if let Some(v) = patch.title {
      self.title = v;
    }
    if let Some(v) = patch.category {
      self.category = v;
    }
    if let Some(v) = patch.project {
      self.project = Some(v);
    }
    if let Some(v) = patch.tags {
      self.tags = sanitize_tags(&v);
    }
    if let Some(v) = patch.business_context {
      self.business_context = v;
    }
    if let Some(v) = patch.problem_statement {
      self.problem_statement = v;
    }
    if let Some(v) = patch.chosen_option {
      self.chosen_option = v;
    }
    if let Some(v) = patch.reasoning {
      self.reasoning = v;
    }
    if let Some(v) = patch.notes {
      self.notes = Some(v);
    }
    if let Some(v) = patch.confidence_level {
      self.confidence_level = Some(v);
    }
    if let Some(v) = patch.decision_type {
      self.decision_type = Some(v);
    }
    if let Some(v) = patch.considered_options {
      self.considered_options = v;
    }
    if let Some(v) = patch.tradeoffs_accepted {
      self.tradeoffs_accepted = v;
    }
    if let Some(v) = patch.tradeoffs_rejected {
      self.tradeoffs_rejected = v;
    }
    if let Some(v) = patch.optimized_for {
      self.optimized_for = v;
    }
    if let Some(v) = patch.flagged_for_review {
      self.flagged_for_review = v;
    }
    if let Some(v) = patch.next_review_date {
      self.next_review_date = Some(v);
    }
    if let Some(v) = patch.revisit_reason {
      self.revisit_reason = Some(v);
    }
    if let Some(v) = patch.related_decisions {
      self.related_decisions = v;
    }
    if let Some(v) = patch.similarity_notes {
      self.similarity_notes = v;
    }
  }

  /// Record an outcome. Separate, narrower path than [`Self::apply_patch`].
  pub fn apply_outcome(&mut self, update: OutcomeUpdate) {
    self.outcome = Some(update.outcome);
    self.outcome_success = Some(update.success);
    self.outcome_date = Some(update.outcome_date.unwrap_or_else(|| Utc::now().date_naive()));
    if let Some(lessons) = update.lessons_learned {
      self.lessons_learned = Some(lessons);
    }
  }
}

// ─── Input types ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::DecisionStore::create`].
/// `id`, `created_at`, and `updated_at` are always set by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDecision {
  pub title:             String,
  pub category:          Category,
  pub business_context:  String,
  pub problem_statement: String,
  pub chosen_option:     String,
  pub reasoning:         String,

  pub project: Option<String>,
  #[serde(default)]
  pub tags:    Vec<String>,
  pub notes:   Option<String>,

  pub confidence_level:   Option<u8>,
  pub decision_type:      Option<DecisionType>,
  #[serde(default)]
  pub considered_options: Vec<ConsideredOption>,

  #[serde(default)]
  pub tradeoffs_accepted: Vec<String>,
  #[serde(default)]
  pub tradeoffs_rejected: Vec<String>,
  #[serde(default)]
  pub optimized_for:      Vec<Dimension>,

  #[serde(default)]
  pub flagged_for_review: bool,
  pub next_review_date:   Option<NaiveDate>,
  pub revisit_reason:     Option<String>,

  #[serde(default)]
  pub related_decisions: Vec<Uuid>,
  #[serde(default)]
  pub similarity_notes:  Vec<SimilarityNote>,
}

impl NewDecision {
  /// Validate all fields, accumulating every failure.
  pub fn validate(&self) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    validate_title(&self.title, &mut errors);
    for (field, value) in [
      ("business_context", &self.business_context),
      ("problem_statement", &self.problem_statement),
      ("chosen_option", &self.chosen_option),
      ("reasoning", &self.reasoning),
    ] {
      if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
      }
    }
    validate_confidence_level(self.confidence_level, &mut errors);

    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

/// Input to [`crate::store::DecisionStore::update`]. Every field is optional;
/// `None` means "leave unchanged". Each present field is validated with the
/// same rule as on create.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionPatch {
  pub title:    Option<String>,
  pub category: Option<Category>,
  pub project:  Option<String>,
  pub tags:     Option<Vec<String>>,

  pub business_context:  Option<String>,
  pub problem_statement: Option<String>,
  pub chosen_option:     Option<String>,
  pub reasoning:         Option<String>,
  pub notes:             Option<String>,

  pub confidence_level:   Option<u8>,
  pub decision_type:      Option<DecisionType>,
  pub considered_options: Option<Vec<ConsideredOption>>,

  pub tradeoffs_accepted: Option<Vec<String>>,
  pub tradeoffs_rejected: Option<Vec<String>>,
  pub optimized_for:      Option<Vec<Dimension>>,

  pub flagged_for_review: Option<bool>,
  pub next_review_date:   Option<NaiveDate>,
  pub revisit_reason:     Option<String>,

  pub related_decisions: Option<Vec<Uuid>>,
  pub similarity_notes:  Option<Vec<SimilarityNote>>,
}

impl DecisionPatch {
  pub fn validate(&self) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if let Some(title) = &self.title {
      validate_title(title, &mut errors);
    }
    for (field, value) in [
      ("business_context", &self.business_context),
      ("problem_statement", &self.problem_statement),
      ("chosen_option", &self.chosen_option),
      ("reasoning", &self.reasoning),
    ] {
      if let Some(v) = value
        && v.trim().is_empty()
      {
        errors.push(FieldError::new(field, format!("{field} cannot be empty")));
      }
    }
    validate_confidence_level(self.confidence_level, &mut errors);

    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

/// Input to [`crate::store::DecisionStore::record_outcome`].
#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeUpdate {
  pub outcome:         String,
  pub success:         bool,
  /// Defaults to today when omitted.
  pub outcome_date:    Option<NaiveDate>,
  pub lessons_learned: Option<String>,
}

impl OutcomeUpdate {
  pub fn validate(&self) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if self.outcome.trim().is_empty() {
      errors.push(FieldError::new("outcome", "outcome is required"));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

// ─── Shared field rules ──────────────────────────────────────────────────────

fn validate_title(title: &str, errors: &mut Vec<FieldError>) {
  let trimmed = title.trim();
  if trimmed.is_empty() {
    errors.push(FieldError::new("title", "title is required"));
  } else if trimmed.chars().count() > MAX_TITLE_LEN {
    errors.push(FieldError::new(
      "title",
      format!("title must be at most {MAX_TITLE_LEN} characters"),
    ));
  }
}

fn validate_confidence_level(level: Option<u8>, errors: &mut Vec<FieldError>) {
  if let Some(level) = level
    && !(1..=10).contains(&level)
  {
    errors.push(FieldError::new(
      "confidence_level",
      "confidence_level must be an integer between 1 and 10",
    ));
  }
}

/// Trim each tag, drop empties, and deduplicate keeping first-occurrence
/// order. Shared by decision inputs and the filter validator.
pub fn sanitize_tags(tags: &[String]) -> Vec<String> {
  let mut seen = Vec::new();
  for tag in tags {
    let trimmed = tag.trim();
    if !trimmed.is_empty() && !seen.iter().any(|t| t == trimmed) {
      seen.push(trimmed.to_owned());
    }
  }
  seen
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  #[test]
  fn category_labels_round_trip() {
    for category in Category::ALL {
      assert_eq!(Category::parse(category.as_str()), Some(category));
    }
    assert_eq!(Category::parse("data-storage"), Some(Category::DataStorage));
    assert_eq!(Category::parse("databases"), None);
  }

  #[test]
  fn sanitize_tags_dedupes_in_first_occurrence_order() {
    let tags = vec!["x".to_owned(), "x".to_owned(), "y".to_owned()];
    assert_eq!(sanitize_tags(&tags), vec!["x", "y"]);

    let tags = vec![" b ".to_owned(), "".to_owned(), "a".to_owned(), "b".to_owned()];
    assert_eq!(sanitize_tags(&tags), vec!["b", "a"]);
  }

  #[test]
  fn new_decision_accumulates_all_errors() {
    let input = NewDecision {
      title:             "".to_owned(),
      category:          Category::Other,
      business_context:  " ".to_owned(),
      problem_statement: "p".to_owned(),
      chosen_option:     "c".to_owned(),
      reasoning:         "r".to_owned(),
      project:           None,
      tags:              vec![],
      notes:             None,
      confidence_level:  Some(11),
      decision_type:     None,
      considered_options: vec![],
      tradeoffs_accepted: vec![],
      tradeoffs_rejected: vec![],
      optimized_for:      vec![],
      flagged_for_review: false,
      next_review_date:   None,
      revisit_reason:     None,
      related_decisions:  vec![],
      similarity_notes:   vec![],
    };

    let errors = input.validate().unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "business_context", "confidence_level"]);
  }

  #[test]
  fn patch_only_validates_present_fields() {
    let patch = DecisionPatch::default();
    assert!(patch.validate().is_ok());

    let patch = DecisionPatch {
      title: Some("t".repeat(201)),
      confidence_level: Some(0),
      ..Default::default()
    };
    let errors = patch.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
  }

  #[test]
  fn apply_outcome_defaults_date_to_today() {
    let mut decision = test_decision();
    decision.apply_outcome(OutcomeUpdate {
      outcome:         "shipped".to_owned(),
      success:         true,
      outcome_date:    None,
      lessons_learned: None,
    });
    assert_eq!(decision.outcome.as_deref(), Some("shipped"));
    assert_eq!(decision.outcome_success, Some(true));
    assert!(decision.outcome_date.is_some());
  }

  pub(crate) fn test_decision() -> Decision {
    Decision {
      id:                 Uuid::new_v4(),
      created_at:         Utc::now(),
      updated_at:         Utc::now(),
      title:              "Adopt SQLite".to_owned(),
      category:           Category::DataStorage,
      project:            Some("verdict".to_owned()),
      tags:               vec!["storage".to_owned()],
      business_context:   "Single-user tool".to_owned(),
      problem_statement:  "Need durable storage".to_owned(),
      chosen_option:      "SQLite".to_owned(),
      reasoning:          "Zero-ops embedded database".to_owned(),
      notes:              None,
      confidence_level:   Some(8),
      decision_type:      Some(DecisionType::Reversible),
      considered_options: vec![],
      tradeoffs_accepted: vec![],
      tradeoffs_rejected: vec![],
      optimized_for:      vec![Dimension::Simplicity],
      flagged_for_review: false,
      next_review_date:   None,
      revisit_reason:     None,
      outcome:            None,
      outcome_date:       None,
      outcome_success:    None,
      lessons_learned:    None,
      related_decisions:  vec![],
      similarity_notes:   vec![],
    }
  }
}
