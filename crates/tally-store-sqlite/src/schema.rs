//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per learner; the aggregate totals of their record.
CREATE TABLE IF NOT EXISTS learners (
    learner_key                  TEXT PRIMARY KEY,   -- lower-cased learner id
    learner_id                   TEXT NOT NULL,      -- as first recorded
    total_sessions_completed     INTEGER NOT NULL,
    overall_average_success_rate REAL NOT NULL,
    last_updated                 TEXT NOT NULL       -- ISO 8601 UTC
);

-- Quiz sessions are append-only.
-- No UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS sessions (
    session_id       TEXT PRIMARY KEY,
    learner_key      TEXT NOT NULL REFERENCES learners(learner_key) ON DELETE CASCADE,
    position         INTEGER NOT NULL,   -- 0-based order within the learner
    subjects_covered TEXT NOT NULL,      -- JSON array, as submitted
    recorded_at      TEXT NOT NULL,      -- ISO 8601 UTC; server-assigned
    total_questions  INTEGER NOT NULL,
    correct_answers  INTEGER NOT NULL,
    success_rate     REAL NOT NULL,
    UNIQUE (learner_key, position)
);

-- Per-subject running totals; rewritten with every save.
CREATE TABLE IF NOT EXISTS subject_progress (
    learner_key           TEXT NOT NULL REFERENCES learners(learner_key) ON DELETE CASCADE,
    subject_key           TEXT NOT NULL,   -- lower-cased subject
    subject               TEXT NOT NULL,   -- as first recorded
    position              INTEGER NOT NULL,
    total_correct_answers INTEGER NOT NULL,
    sessions_completed    INTEGER NOT NULL,
    average_success_rate  REAL NOT NULL,
    PRIMARY KEY (learner_key, subject_key)
);

CREATE INDEX IF NOT EXISTS sessions_learner_idx ON sessions(learner_key, position);

PRAGMA user_version = 1;
";
