//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO 8601
//! dates, list-valued fields as compact JSON arrays, enum fields as their
//! kebab-case labels, and UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use verdict_core::decision::{
  Category, ConsideredOption, Decision, DecisionType, Dimension, SimilarityNote,
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime / NaiveDate ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse().map_err(|_| Error::DateParse(format!("invalid date: {s:?}")))
}

// ─── Enum labels ─────────────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> {
  Category::parse(s).ok_or_else(|| Error::UnknownLabel {
    kind:  "category",
    value: s.to_owned(),
  })
}

pub fn decode_decision_type(s: &str) -> Result<DecisionType> {
  DecisionType::parse(s).ok_or_else(|| Error::UnknownLabel {
    kind:  "decision_type",
    value: s.to_owned(),
  })
}

// ─── JSON list columns ───────────────────────────────────────────────────────

pub fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw column values read directly from a `decisions` row, in schema order.
pub struct RawDecision {
  pub id:                 String,
  pub created_at:         String,
  pub updated_at:         String,
  pub title:              String,
  pub category:           String,
  pub project:            Option<String>,
  pub tags:               String,
  pub business_context:   String,
  pub problem_statement:  String,
  pub chosen_option:      String,
  pub reasoning:          String,
  pub notes:              Option<String>,
  pub confidence_level:   Option<i64>,
  pub decision_type:      Option<String>,
  pub considered_options: String,
  pub tradeoffs_accepted: String,
  pub tradeoffs_rejected: String,
  pub optimized_for:      String,
  pub flagged_for_review: bool,
  pub next_review_date:   Option<String>,
  pub revisit_reason:     Option<String>,
  pub outcome:            Option<String>,
  pub outcome_date:       Option<String>,
  pub outcome_success:    Option<bool>,
  pub lessons_learned:    Option<String>,
  pub related_decisions:  String,
  pub similarity_notes:   String,
  /// Derived column; compared (not decoded) by the reindex sweep and
  /// dropped when converting to the public [`Decision`].
  pub search_index:       String,
}

/// The SELECT column list matching [`RawDecision`] field order.
pub const DECISION_COLUMNS: &str = "\
  id, created_at, updated_at, title, category, project, tags, \
  business_context, problem_statement, chosen_option, reasoning, notes, \
  confidence_level, decision_type, considered_options, tradeoffs_accepted, \
  tradeoffs_rejected, optimized_for, flagged_for_review, next_review_date, \
  revisit_reason, outcome, outcome_date, outcome_success, lessons_learned, \
  related_decisions, similarity_notes, search_index";

impl RawDecision {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      created_at:         row.get(1)?,
      updated_at:         row.get(2)?,
      title:              row.get(3)?,
      category:           row.get(4)?,
      project:            row.get(5)?,
      tags:               row.get(6)?,
      business_context:   row.get(7)?,
      problem_statement:  row.get(8)?,
      chosen_option:      row.get(9)?,
      reasoning:          row.get(10)?,
      notes:              row.get(11)?,
      confidence_level:   row.get(12)?,
      decision_type:      row.get(13)?,
      considered_options: row.get(14)?,
      tradeoffs_accepted: row.get(15)?,
      tradeoffs_rejected: row.get(16)?,
      optimized_for:      row.get(17)?,
      flagged_for_review: row.get(18)?,
      next_review_date:   row.get(19)?,
      revisit_reason:     row.get(20)?,
      outcome:            row.get(21)?,
      outcome_date:       row.get(22)?,
      outcome_success:    row.get(23)?,
      lessons_learned:    row.get(24)?,
      related_decisions:  row.get(25)?,
      similarity_notes:   row.get(26)?,
      search_index:       row.get(27)?,
    })
  }

  pub fn into_decision(self) -> Result<Decision> {
    let considered_options: Vec<ConsideredOption> =
      decode_json(&self.considered_options)?;
    let optimized_for: Vec<Dimension> = decode_json(&self.optimized_for)?;
    let similarity_notes: Vec<SimilarityNote> = decode_json(&self.similarity_notes)?;

    let related_decisions = decode_json::<Vec<String>>(&self.related_decisions)?
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<Vec<Uuid>>>()?;

    Ok(Decision {
      id:                 decode_uuid(&self.id)?,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
      title:              self.title,
      category:           decode_category(&self.category)?,
      project:            self.project,
      tags:               decode_json(&self.tags)?,
      business_context:   self.business_context,
      problem_statement:  self.problem_statement,
      chosen_option:      self.chosen_option,
      reasoning:          self.reasoning,
      notes:              self.notes,
      confidence_level:   self.confidence_level.map(|n| n as u8),
      decision_type:      self
        .decision_type
        .as_deref()
        .map(decode_decision_type)
        .transpose()?,
      considered_options,
      tradeoffs_accepted: decode_json(&self.tradeoffs_accepted)?,
      tradeoffs_rejected: decode_json(&self.tradeoffs_rejected)?,
      optimized_for,
      flagged_for_review: self.flagged_for_review,
      next_review_date:   self.next_review_date.as_deref().map(decode_date).transpose()?,
      revisit_reason:     self.revisit_reason,
      outcome:            self.outcome,
      outcome_date:       self.outcome_date.as_deref().map(decode_date).transpose()?,
      outcome_success:    self.outcome_success,
      lessons_learned:    self.lessons_learned,
      related_decisions,
      similarity_notes,
    })
  }
}
