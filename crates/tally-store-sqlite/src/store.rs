//! [`SqliteStore`], the SQLite implementation of [`ProgressStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tally_core::{
  progress::{LearnerProgress, learner_key},
  store::ProgressStore,
};

use crate::{
  Result,
  encode::{RawLearner, RawSession, RawSubject},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A progress store backed by a single SQLite file.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
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
}

// ─── Row access ──────────────────────────────────────────────────────────────

/// Read one learner with its sessions and subjects, or `None` if absent.
fn read_learner(
  conn: &rusqlite::Connection,
  key: &str,
) -> rusqlite::Result<Option<RawLearner>> {
  let head = conn
    .query_row(
      "SELECT learner_id, total_sessions_completed,
              overall_average_success_rate, last_updated
       FROM learners WHERE learner_key = ?1",
      rusqlite::params![key],
      |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, i64>(1)?,
          row.get::<_, f64>(2)?,
          row.get::<_, String>(3)?,
        ))
      },
    )
    .optional()?;

  let Some((learner_id, total, overall, last_updated)) = head else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT session_id, subjects_covered, recorded_at,
            total_questions, correct_answers, success_rate
     FROM sessions WHERE learner_key = ?1
     ORDER BY position",
  )?;
  let sessions = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawSession {
        session_id:       row.get(0)?,
        subjects_covered: row.get(1)?,
        recorded_at:      row.get(2)?,
        total_questions:  row.get(3)?,
        correct_answers:  row.get(4)?,
        success_rate:     row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT subject_key, subject, total_correct_answers,
            sessions_completed, average_success_rate
     FROM subject_progress WHERE learner_key = ?1
     ORDER BY position",
  )?;
  let subjects = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawSubject {
        subject_key:           row.get(0)?,
        subject:               row.get(1)?,
        total_correct_answers: row.get(2)?,
        sessions_completed:    row.get(3)?,
        average_success_rate:  row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(RawLearner {
    learner_key: key.to_owned(),
    learner_id,
    total_sessions_completed: total,
    overall_average_success_rate: overall,
    last_updated,
    sessions,
    subjects,
  }))
}

/// Write a whole learner record inside one transaction.
///
/// When the stored sessions are a prefix of `raw.sessions` only the new tail
/// is inserted; otherwise the learner's sessions are rewritten. Subject rows
/// are replaced wholesale.
fn write_learner(
  conn: &mut rusqlite::Connection,
  raw: &RawLearner,
) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;

  tx.execute(
    "INSERT INTO learners (
       learner_key, learner_id, total_sessions_completed,
       overall_average_success_rate, last_updated
     ) VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (learner_key) DO UPDATE SET
       learner_id                   = excluded.learner_id,
       total_sessions_completed     = excluded.total_sessions_completed,
       overall_average_success_rate = excluded.overall_average_success_rate,
       last_updated                 = excluded.last_updated",
    rusqlite::params![
      raw.learner_key,
      raw.learner_id,
      raw.total_sessions_completed,
      raw.overall_average_success_rate,
      raw.last_updated,
    ],
  )?;

  let stored: Vec<String> = {
    let mut stmt = tx.prepare(
      "SELECT session_id FROM sessions WHERE learner_key = ?1 ORDER BY position",
    )?;
    stmt
      .query_map(rusqlite::params![raw.learner_key], |row| row.get(0))?
      .collect::<rusqlite::Result<_>>()?
  };

  // Append only when the stored history is a prefix of the new one.
  let is_prefix = stored.len() <= raw.sessions.len()
    && stored
      .iter()
      .zip(&raw.sessions)
      .all(|(id, s)| *id == s.session_id);
  let keep = if is_prefix {
    stored.len()
  } else {
    tx.execute(
      "DELETE FROM sessions WHERE learner_key = ?1",
      rusqlite::params![raw.learner_key],
    )?;
    0
  };

  {
    let mut insert = tx.prepare(
      "INSERT INTO sessions (
         session_id, learner_key, position, subjects_covered, recorded_at,
         total_questions, correct_answers, success_rate
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (position, s) in raw.sessions.iter().enumerate().skip(keep) {
      insert.execute(rusqlite::params![
        s.session_id,
        raw.learner_key,
        position as i64,
        s.subjects_covered,
        s.recorded_at,
        s.total_questions,
        s.correct_answers,
        s.success_rate,
      ])?;
    }
  }

  tx.execute(
    "DELETE FROM subject_progress WHERE learner_key = ?1",
    rusqlite::params![raw.learner_key],
  )?;
  {
    let mut insert = tx.prepare(
      "INSERT INTO subject_progress (
         learner_key, subject_key, subject, position,
         total_correct_answers, sessions_completed, average_success_rate
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (position, s) in raw.subjects.iter().enumerate() {
      insert.execute(rusqlite::params![
        raw.learner_key,
        s.subject_key,
        s.subject,
        position as i64,
        s.total_correct_answers,
        s.sessions_completed,
        s.average_success_rate,
      ])?;
    }
  }

  tx.commit()
}

// ─── ProgressStore impl ──────────────────────────────────────────────────────

impl ProgressStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self, learner_id: &str) -> Result<Option<LearnerProgress>> {
    let key = learner_key(learner_id);

    let raw = self
      .conn
      .call(move |conn| Ok(read_learner(conn, &key)?))
      .await?;

    raw.map(RawLearner::into_progress).transpose()
  }

  async fn save(&self, progress: &LearnerProgress) -> Result<()> {
    let raw = RawLearner::encode(progress)?;

    self
      .conn
      .call(move |conn| Ok(write_learner(conn, &raw)?))
      .await?;

    tracing::debug!(learner = %progress.learner_id, "saved progress");
    Ok(())
  }

  async fn delete(&self, learner_id: &str) -> Result<bool> {
    let key = learner_key(learner_id);

    // Sessions and subject rows go with the learner via ON DELETE CASCADE.
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM learners WHERE learner_key = ?1",
          rusqlite::params![key],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list_all(&self) -> Result<Vec<LearnerProgress>> {
    let raws: Vec<RawLearner> = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let keys = {
          let mut stmt =
            tx.prepare("SELECT learner_key FROM learners ORDER BY learner_key")?;
          stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut raws = Vec::with_capacity(keys.len());
        for key in keys {
          if let Some(raw) = read_learner(&tx, &key)? {
            raws.push(raw);
          }
        }
        tx.commit()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawLearner::into_progress).collect()
  }
}
