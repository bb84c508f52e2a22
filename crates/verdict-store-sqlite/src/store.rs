//! [`SqliteStore`] — the SQLite implementation of [`DecisionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value as SqlValue};
use uuid::Uuid;
use verdict_core::{
  decision::{
    Category, Decision, DecisionPatch, NewDecision, OutcomeUpdate, sanitize_tags,
  },
  index::{normalize, search_index},
  plan::{Page, Predicate, QueryPlan, SortOrder, SortPlan},
  store::{
    ConfidenceRange, DecisionStore, FilterMetadata, OutcomeCounts, ReindexReport,
  },
};

use crate::{
  Error, Result,
  encode::{
    DECISION_COLUMNS, RawDecision, decode_category, encode_date, encode_dt,
    encode_json, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Verdict decision store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Test hook: run arbitrary SQL against the underlying connection, e.g.
  /// to simulate an external writer corrupting the derived index.
  #[cfg(test)]
  pub(crate) async fn raw_execute(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a fully-built [`Decision`]. The derived index is computed here
  /// and lands in the same INSERT as every other column.
  async fn insert_decision(&self, decision: &Decision) -> Result<()> {
    let row = encode_row(decision)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO decisions (
             id, created_at, updated_at, title, category, project, tags,
             business_context, problem_statement, chosen_option, reasoning,
             notes, confidence_level, decision_type, considered_options,
             tradeoffs_accepted, tradeoffs_rejected, optimized_for,
             flagged_for_review, next_review_date, revisit_reason,
             outcome, outcome_date, outcome_success, lessons_learned,
             related_decisions, similarity_notes, search_index
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                     ?25, ?26, ?27, ?28)",
          params![
            row.id,
            row.created_at,
            row.updated_at,
            row.title,
            row.category,
            row.project,
            row.tags,
            row.business_context,
            row.problem_statement,
            row.chosen_option,
            row.reasoning,
            row.notes,
            row.confidence_level,
            row.decision_type,
            row.considered_options,
            row.tradeoffs_accepted,
            row.tradeoffs_rejected,
            row.optimized_for,
            row.flagged_for_review,
            row.next_review_date,
            row.revisit_reason,
            row.outcome,
            row.outcome_date,
            row.outcome_success,
            row.lessons_learned,
            row.related_decisions,
            row.similarity_notes,
            row.search_index,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Rewrite every mutable column of an existing row, recomputing the
  /// derived index in the same UPDATE so the two can never diverge.
  async fn write_decision(&self, decision: &Decision) -> Result<()> {
    let row = encode_row(decision)?;

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE decisions SET
             updated_at = ?2, title = ?3, category = ?4, project = ?5,
             tags = ?6, business_context = ?7, problem_statement = ?8,
             chosen_option = ?9, reasoning = ?10, notes = ?11,
             confidence_level = ?12, decision_type = ?13,
             considered_options = ?14, tradeoffs_accepted = ?15,
             tradeoffs_rejected = ?16, optimized_for = ?17,
             flagged_for_review = ?18, next_review_date = ?19,
             revisit_reason = ?20, outcome = ?21, outcome_date = ?22,
             outcome_success = ?23, lessons_learned = ?24,
             related_decisions = ?25, similarity_notes = ?26,
             search_index = ?27
           WHERE id = ?1",
          params![
            row.id,
            row.updated_at,
            row.title,
            row.category,
            row.project,
            row.tags,
            row.business_context,
            row.problem_statement,
            row.chosen_option,
            row.reasoning,
            row.notes,
            row.confidence_level,
            row.decision_type,
            row.considered_options,
            row.tradeoffs_accepted,
            row.tradeoffs_rejected,
            row.optimized_for,
            row.flagged_for_review,
            row.next_review_date,
            row.revisit_reason,
            row.outcome,
            row.outcome_date,
            row.outcome_success,
            row.lessons_learned,
            row.related_decisions,
            row.similarity_notes,
            row.search_index,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if updated == 0 {
      return Err(Error::DecisionNotFound(decision.id));
    }
    Ok(())
  }

  // ── Facet queries — each independent, joined by `metadata` ──────────────

  async fn facet_categories(&self) -> Result<Vec<Category>> {
    let labels: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT DISTINCT category FROM decisions")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut categories = labels
      .iter()
      .map(|s| decode_category(s))
      .collect::<Result<Vec<_>>>()?;
    categories.sort();
    Ok(categories)
  }

  async fn facet_projects(&self) -> Result<Vec<String>> {
    let projects = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT project FROM decisions
           WHERE project IS NOT NULL ORDER BY project",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(projects)
  }

  async fn facet_tags(&self) -> Result<Vec<String>> {
    let tags = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT json_each.value
           FROM decisions, json_each(decisions.tags)
           ORDER BY json_each.value",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tags)
  }

  async fn facet_confidence_range(&self) -> Result<Option<ConfidenceRange>> {
    let (min, max): (Option<i64>, Option<i64>) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT MIN(confidence_level), MAX(confidence_level) FROM decisions",
          [],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(match (min, max) {
      (Some(min), Some(max)) => Some(ConfidenceRange {
        min: min as u8,
        max: max as u8,
      }),
      _ => None,
    })
  }

  async fn facet_outcome_counts(&self) -> Result<OutcomeCounts> {
    let (total, pending, success, failed): (i64, i64, i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             COUNT(*),
             COALESCE(SUM(CASE WHEN outcome_success IS NULL THEN 1 ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN outcome_success = 1 THEN 1 ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN outcome_success = 0 THEN 1 ELSE 0 END), 0)
           FROM decisions",
          [],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?)
      })
      .await?;

    Ok(OutcomeCounts {
      total:   total as usize,
      pending: pending as usize,
      success: success as usize,
      failed:  failed as usize,
    })
  }
}

// ─── Row encoding ────────────────────────────────────────────────────────────

/// Column values for a full-row write, in schema order. The search index is
/// always recomputed from the decision being written — never carried over.
struct EncodedRow {
  id:                 String,
  created_at:         String,
  updated_at:         String,
  title:              String,
  category:           String,
  project:            Option<String>,
  tags:               String,
  business_context:   String,
  problem_statement:  String,
  chosen_option:      String,
  reasoning:          String,
  notes:              Option<String>,
  confidence_level:   Option<i64>,
  decision_type:      Option<String>,
  considered_options: String,
  tradeoffs_accepted: String,
  tradeoffs_rejected: String,
  optimized_for:      String,
  flagged_for_review: bool,
  next_review_date:   Option<String>,
  revisit_reason:     Option<String>,
  outcome:            Option<String>,
  outcome_date:       Option<String>,
  outcome_success:    Option<bool>,
  lessons_learned:    Option<String>,
  related_decisions:  String,
  similarity_notes:   String,
  search_index:       String,
}

fn encode_row(decision: &Decision) -> Result<EncodedRow> {
  let related: Vec<String> =
    decision.related_decisions.iter().copied().map(encode_uuid).collect();

  Ok(EncodedRow {
    id:                 encode_uuid(decision.id),
    created_at:         encode_dt(decision.created_at),
    updated_at:         encode_dt(decision.updated_at),
    title:              decision.title.clone(),
    category:           decision.category.as_str().to_owned(),
    project:            decision.project.clone(),
    tags:               encode_json(&decision.tags)?,
    business_context:   decision.business_context.clone(),
    problem_statement:  decision.problem_statement.clone(),
    chosen_option:      decision.chosen_option.clone(),
    reasoning:          decision.reasoning.clone(),
    notes:              decision.notes.clone(),
    confidence_level:   decision.confidence_level.map(i64::from),
    decision_type:      decision.decision_type.map(|t| t.as_str().to_owned()),
    considered_options: encode_json(&decision.considered_options)?,
    tradeoffs_accepted: encode_json(&decision.tradeoffs_accepted)?,
    tradeoffs_rejected: encode_json(&decision.tradeoffs_rejected)?,
    optimized_for:      encode_json(&decision.optimized_for)?,
    flagged_for_review: decision.flagged_for_review,
    next_review_date:   decision.next_review_date.map(encode_date),
    revisit_reason:     decision.revisit_reason.clone(),
    outcome:            decision.outcome.clone(),
    outcome_date:       decision.outcome_date.map(encode_date),
    outcome_success:    decision.outcome_success,
    lessons_learned:    decision.lessons_learned.clone(),
    related_decisions:  encode_json(&related)?,
    similarity_notes:   encode_json(&decision.similarity_notes)?,
    search_index:       search_index(decision),
  })
}

// ─── Plan translation ────────────────────────────────────────────────────────

/// Translate the plan's predicates into a WHERE conjunction plus its bound
/// arguments. An absent filter contributed no predicate upstream, so there
/// is nothing to special-case here.
/// Escape `%`, `_`, and the escape character itself so a search term is
/// matched literally rather than as a LIKE pattern. The relevance ranking
/// binds the unescaped term: `replace()` is already literal, and escaping
/// there would miss the very occurrences LIKE just matched.
fn escape_like(term: &str) -> String {
  term
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_")
}

fn build_where(predicates: &[Predicate]) -> (String, Vec<SqlValue>) {
  let mut conds: Vec<String> = Vec::new();
  let mut args: Vec<SqlValue> = Vec::new();

  for predicate in predicates {
    match predicate {
      Predicate::Search(term) => {
        conds.push("search_index LIKE ? ESCAPE '\\'".to_owned());
        args.push(SqlValue::Text(format!("%{}%", escape_like(&normalize(term)))));
      }
      Predicate::Category(category) => {
        conds.push("category = ?".to_owned());
        args.push(SqlValue::Text(category.as_str().to_owned()));
      }
      Predicate::Project(project) => {
        conds.push("project = ?".to_owned());
        args.push(SqlValue::Text(project.clone()));
      }
      Predicate::TagsAll(tags) => {
        // Superset containment: one EXISTS per requested tag.
        for tag in tags {
          conds.push(
            "EXISTS (SELECT 1 FROM json_each(decisions.tags)
                     WHERE json_each.value = ?)"
              .to_owned(),
          );
          args.push(SqlValue::Text(tag.clone()));
        }
      }
      Predicate::ConfidenceAtLeast(min) => {
        conds.push("confidence_level >= ?".to_owned());
        args.push(SqlValue::Integer(i64::from(*min)));
      }
      Predicate::ConfidenceAtMost(max) => {
        conds.push("confidence_level <= ?".to_owned());
        args.push(SqlValue::Integer(i64::from(*max)));
      }
      Predicate::OutcomeSuccess(None) => {
        conds.push("outcome_success IS NULL".to_owned());
      }
      Predicate::OutcomeSuccess(Some(success)) => {
        conds.push("outcome_success = ?".to_owned());
        args.push(SqlValue::Integer(i64::from(*success)));
      }
      Predicate::Flagged(flagged) => {
        conds.push("flagged_for_review = ?".to_owned());
        args.push(SqlValue::Integer(i64::from(*flagged)));
      }
    }
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, args)
}

/// Translate the sort plan into an ORDER BY clause plus its arguments.
/// Every ordering ends in `created_at`/`id` tiebreaks so pagination is
/// stable and deterministic.
fn build_order(sort: &SortPlan) -> (String, Vec<SqlValue>) {
  match sort {
    SortPlan::CreatedAt(SortOrder::Desc) => {
      ("ORDER BY created_at DESC, id DESC".to_owned(), Vec::new())
    }
    SortPlan::CreatedAt(SortOrder::Asc) => {
      ("ORDER BY created_at ASC, id ASC".to_owned(), Vec::new())
    }
    SortPlan::Confidence(SortOrder::Desc) => (
      "ORDER BY confidence_level DESC, created_at DESC, id DESC".to_owned(),
      Vec::new(),
    ),
    SortPlan::Confidence(SortOrder::Asc) => (
      "ORDER BY confidence_level ASC, created_at DESC, id DESC".to_owned(),
      Vec::new(),
    ),
    SortPlan::Relevance { term } => (
      // Occurrence count of the normalised term in the normalised index.
      "ORDER BY (length(search_index) - length(replace(search_index, ?, ''))) DESC,
                created_at DESC, id DESC"
        .to_owned(),
      vec![SqlValue::Text(normalize(term))],
    ),
  }
}

// ─── DecisionStore impl ──────────────────────────────────────────────────────

impl DecisionStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewDecision) -> Result<Decision> {
    let now = Utc::now();
    let decision = Decision {
      id:                 Uuid::new_v4(),
      created_at:         now,
      updated_at:         now,
      title:              input.title,
      category:           input.category,
      project:            input.project,
      tags:               sanitize_tags(&input.tags),
      business_context:   input.business_context,
      problem_statement:  input.problem_statement,
      chosen_option:      input.chosen_option,
      reasoning:          input.reasoning,
      notes:              input.notes,
      confidence_level:   input.confidence_level,
      decision_type:      input.decision_type,
      considered_options: input.considered_options,
      tradeoffs_accepted: input.tradeoffs_accepted,
      tradeoffs_rejected: input.tradeoffs_rejected,
      optimized_for:      input.optimized_for,
      flagged_for_review: input.flagged_for_review,
      next_review_date:   input.next_review_date,
      revisit_reason:     input.revisit_reason,
      outcome:            None,
      outcome_date:       None,
      outcome_success:    None,
      lessons_learned:    None,
      related_decisions:  input.related_decisions,
      similarity_notes:   input.similarity_notes,
    };

    self.insert_decision(&decision).await?;
    Ok(decision)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Decision>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDecision> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DECISION_COLUMNS} FROM decisions WHERE id = ?1"),
              params![id_str],
              RawDecision::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDecision::into_decision).transpose()
  }

  async fn update(&self, id: Uuid, patch: DecisionPatch) -> Result<Decision> {
    let mut decision =
      self.get(id).await?.ok_or(Error::DecisionNotFound(id))?;

    decision.apply_patch(patch);
    decision.updated_at = Utc::now();

    self.write_decision(&decision).await?;
    Ok(decision)
  }

  async fn record_outcome(&self, id: Uuid, update: OutcomeUpdate) -> Result<Decision> {
    let mut decision =
      self.get(id).await?.ok_or(Error::DecisionNotFound(id))?;

    decision.apply_outcome(update);
    decision.updated_at = Utc::now();

    self.write_decision(&decision).await?;
    Ok(decision)
  }

  async fn search(&self, plan: &QueryPlan) -> Result<Page<Decision>> {
    let window = plan.window;
    let plan = plan.clone();

    let (raws, total): (Vec<RawDecision>, i64) = self
      .conn
      .call(move |conn| {
        let (where_clause, where_args) = build_where(&plan.predicates);
        let (order_clause, order_args) = build_order(&plan.sort);

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM decisions {where_clause}"),
          params_from_iter(where_args.iter()),
          |row| row.get(0),
        )?;

        let sql = format!(
          "SELECT {DECISION_COLUMNS} FROM decisions
           {where_clause} {order_clause} LIMIT ? OFFSET ?"
        );

        let mut args = where_args;
        args.extend(order_args);
        args.push(SqlValue::Integer(plan.window.limit as i64));
        args.push(SqlValue::Integer(plan.window.offset as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawDecision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawDecision::into_decision)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page {
      items,
      total: total as usize,
      limit: window.limit,
      offset: window.offset,
    })
  }

  async fn metadata(&self) -> Result<FilterMetadata> {
    // Five independent read-only queries, fanned out and joined. One
    // failure fails the whole call; there are no partial results.
    let (categories, projects, tags, confidence_range, outcome_counts) = tokio::try_join!(
      self.facet_categories(),
      self.facet_projects(),
      self.facet_tags(),
      self.facet_confidence_range(),
      self.facet_outcome_counts(),
    )?;

    Ok(FilterMetadata {
      categories,
      projects,
      tags,
      confidence_range,
      outcome_counts,
    })
  }

  async fn reindex_all(&self) -> Result<ReindexReport> {
    let raws: Vec<RawDecision> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {DECISION_COLUMNS} FROM decisions"))?;
        let rows = stmt
          .query_map([], RawDecision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let scanned = raws.len();
    let mut changed: Vec<(String, String, String)> = Vec::new();

    for raw in raws {
      let id = raw.id.clone();
      let stored = raw.search_index.clone();
      let decision = raw.into_decision()?;
      let fresh = search_index(&decision);
      if fresh != stored {
        changed.push((id, fresh, stored));
      }
    }

    let stale = changed.len();
    if stale > 0 {
      tracing::warn!(stale, scanned, "stale search indexes found during reindex sweep");
    }

    let refreshed = if changed.is_empty() {
      0
    } else {
      // updated_at is bumped only for rows whose index value actually
      // changed; untouched rows keep their timestamps. The write is
      // conditional on the index value observed during the read phase: a
      // row rewritten by an ordinary update in the meantime already
      // carries a fresh index, and the sweep must not clobber it with a
      // recomputation of the older field values.
      let now = encode_dt(Utc::now());
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let mut refreshed = 0usize;
          for (id, fresh, observed) in &changed {
            refreshed += tx.execute(
              "UPDATE decisions SET search_index = ?1, updated_at = ?2
               WHERE id = ?3 AND search_index = ?4",
              params![fresh, now, id, observed],
            )?;
          }
          tx.commit()?;
          Ok(refreshed)
        })
        .await?
    };

    Ok(ReindexReport { scanned, stale, refreshed })
  }
}
