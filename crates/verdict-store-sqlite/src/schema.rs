//! SQL schema for the Verdict SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per logged decision. List-valued fields are JSON arrays.
-- search_index is derived from every textual/classification field and is
-- rewritten in the same statement as any field change.
CREATE TABLE IF NOT EXISTS decisions (
    id                 TEXT PRIMARY KEY,
    created_at         TEXT NOT NULL,    -- RFC 3339 UTC; server-assigned
    updated_at         TEXT NOT NULL,    -- RFC 3339 UTC; bumped on update
    title              TEXT NOT NULL,
    category           TEXT NOT NULL,    -- Category label, kebab-case
    project            TEXT,
    tags               TEXT NOT NULL DEFAULT '[]',
    business_context   TEXT NOT NULL,
    problem_statement  TEXT NOT NULL,
    chosen_option      TEXT NOT NULL,
    reasoning          TEXT NOT NULL,
    notes              TEXT,
    confidence_level   INTEGER,          -- 1..10 when present
    decision_type      TEXT,             -- DecisionType label
    considered_options TEXT NOT NULL DEFAULT '[]',
    tradeoffs_accepted TEXT NOT NULL DEFAULT '[]',
    tradeoffs_rejected TEXT NOT NULL DEFAULT '[]',
    optimized_for      TEXT NOT NULL DEFAULT '[]',
    flagged_for_review INTEGER NOT NULL DEFAULT 0,
    next_review_date   TEXT,             -- ISO 8601 date
    revisit_reason     TEXT,
    outcome            TEXT,
    outcome_date       TEXT,             -- ISO 8601 date
    outcome_success    INTEGER,          -- 1 | 0 | NULL = pending
    lessons_learned    TEXT,
    related_decisions  TEXT NOT NULL DEFAULT '[]',
    similarity_notes   TEXT NOT NULL DEFAULT '[]',
    search_index       TEXT NOT NULL     -- derived; see verdict_core::index
);

CREATE INDEX IF NOT EXISTS decisions_category_idx   ON decisions(category);
CREATE INDEX IF NOT EXISTS decisions_project_idx    ON decisions(project);
CREATE INDEX IF NOT EXISTS decisions_created_idx    ON decisions(created_at);
CREATE INDEX IF NOT EXISTS decisions_confidence_idx ON decisions(confidence_level);

PRAGMA user_version = 1;
";
