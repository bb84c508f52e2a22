//! The derived search-index projection.
//!
//! [`search_index`] is a pure, deterministic function of a decision's
//! current field values. The store recomputes it unconditionally on every
//! create and update, never conditionally on which fields changed.
//! Reindexing only for a hand-picked subset of columns leaves the index
//! stale (and the decision unfindable by tag or category terms) after any
//! other edit; projecting the whole record removes that class of bug.

use crate::decision::Decision;

/// Compute the search-index value for a decision.
///
/// The projection covers every textual and classification field: title,
/// narrative fields, category label, tags, project, considered options,
/// tradeoffs, review reason, and the recorded outcome. Idempotent —
/// unchanged input always yields a byte-identical value, which makes the
/// bulk reindex sweep safely re-runnable.
pub fn search_index(decision: &Decision) -> String {
  let mut parts: Vec<&str> = vec![
    &decision.title,
    &decision.business_context,
    &decision.problem_statement,
    &decision.chosen_option,
    &decision.reasoning,
    decision.category.as_str(),
  ];

  if let Some(notes) = &decision.notes {
    parts.push(notes);
  }
  if let Some(project) = &decision.project {
    parts.push(project);
  }
  parts.extend(decision.tags.iter().map(String::as_str));

  for option in &decision.considered_options {
    parts.push(&option.name);
    parts.push(&option.description);
    parts.extend(option.pros.iter().map(String::as_str));
    parts.extend(option.cons.iter().map(String::as_str));
  }

  parts.extend(decision.tradeoffs_accepted.iter().map(String::as_str));
  parts.extend(decision.tradeoffs_rejected.iter().map(String::as_str));

  if let Some(reason) = &decision.revisit_reason {
    parts.push(reason);
  }
  if let Some(outcome) = &decision.outcome {
    parts.push(outcome);
  }
  if let Some(lessons) = &decision.lessons_learned {
    parts.push(lessons);
  }

  for note in &decision.similarity_notes {
    parts.push(&note.reason);
    parts.push(&note.comparison);
  }

  normalize(&parts.join(" "))
}

/// Normalise a search term the same way the index itself is normalised,
/// so LIKE matching and occurrence ranking compare like with like.
pub fn normalize(text: &str) -> String {
  text
    .split_whitespace()
    .map(|word| word.to_lowercase())
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decision::tests::test_decision;

  #[test]
  fn reindex_is_idempotent() {
    let decision = test_decision();
    assert_eq!(search_index(&decision), search_index(&decision));
  }

  #[test]
  fn projection_is_lowercased_and_whitespace_normalised() {
    let mut decision = test_decision();
    decision.title = "  Adopt   SQLite\tNOW ".to_owned();
    let index = search_index(&decision);
    assert!(index.contains("adopt sqlite now"));
    assert!(!index.contains("  "));
  }

  #[test]
  fn every_textual_field_feeds_the_projection() {
    let mut decision = test_decision();
    decision.notes = Some("notes-marker".to_owned());
    decision.revisit_reason = Some("revisit-marker".to_owned());
    decision.outcome = Some("outcome-marker".to_owned());
    decision.lessons_learned = Some("lessons-marker".to_owned());
    decision.tradeoffs_accepted = vec!["accepted-marker".to_owned()];
    decision.tradeoffs_rejected = vec!["rejected-marker".to_owned()];
    decision.tags = vec!["tag-marker".to_owned()];

    let index = search_index(&decision);
    for marker in [
      "adopt sqlite",
      "single-user tool",
      "need durable storage",
      "zero-ops embedded database",
      "data-storage",
      "verdict",
      "notes-marker",
      "revisit-marker",
      "outcome-marker",
      "lessons-marker",
      "accepted-marker",
      "rejected-marker",
      "tag-marker",
    ] {
      assert!(index.contains(marker), "missing {marker:?} in {index:?}");
    }
  }

  #[test]
  fn changing_any_field_changes_the_projection() {
    let decision = test_decision();
    let before = search_index(&decision);

    let mut edited = decision.clone();
    edited.tags.push("unique-new-tag".to_owned());
    assert_ne!(before, search_index(&edited));

    let mut edited = decision;
    edited.outcome = Some("unique-outcome-text".to_owned());
    assert_ne!(before, search_index(&edited));
  }
}
