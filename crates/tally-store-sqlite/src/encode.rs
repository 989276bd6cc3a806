//! Encoding and decoding helpers between Tally domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings and subject lists as compact JSON. Success rates are `REAL` columns,
//! which hold an `f64` exactly.

use chrono::{DateTime, Utc};
use tally_core::progress::{LearnerProgress, QuizSession, SubjectProgress};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Subject lists ────────────────────────────────────────────────────────────

pub fn encode_subjects(subjects: &[String]) -> Result<String> {
  Ok(serde_json::to_string(subjects)?)
}

pub fn decode_subjects(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Counts ───────────────────────────────────────────────────────────────────

// SQLite integers are signed 64-bit.

fn encode_count(v: u64, column: &str) -> Result<i64> {
  i64::try_from(v).map_err(|_| Error::OutOfRange(format!("{column} = {v}")))
}

fn decode_count<T: TryFrom<i64>>(v: i64, column: &str) -> Result<T> {
  T::try_from(v).map_err(|_| Error::OutOfRange(format!("{column} = {v}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values for one `sessions` row. The position column is the index in
/// [`RawLearner::sessions`].
pub struct RawSession {
  pub session_id:       String,
  pub subjects_covered: String,
  pub recorded_at:      String,
  pub total_questions:  i64,
  pub correct_answers:  i64,
  pub success_rate:     f64,
}

impl RawSession {
  fn encode(s: &QuizSession) -> Result<Self> {
    Ok(Self {
      session_id:       encode_uuid(s.session_id),
      subjects_covered: encode_subjects(&s.subjects_covered)?,
      recorded_at:      encode_dt(s.timestamp),
      total_questions:  i64::from(s.total_questions),
      correct_answers:  i64::from(s.correct_answers),
      success_rate:     s.success_rate,
    })
  }

  fn into_session(self) -> Result<QuizSession> {
    Ok(QuizSession {
      session_id:       decode_uuid(&self.session_id)?,
      subjects_covered: decode_subjects(&self.subjects_covered)?,
      timestamp:        decode_dt(&self.recorded_at)?,
      total_questions:  decode_count(self.total_questions, "total_questions")?,
      correct_answers:  decode_count(self.correct_answers, "correct_answers")?,
      success_rate:     self.success_rate,
    })
  }
}

/// Raw values for one `subject_progress` row.
pub struct RawSubject {
  pub subject_key:           String,
  pub subject:               String,
  pub total_correct_answers: i64,
  pub sessions_completed:    i64,
  pub average_success_rate:  f64,
}

impl RawSubject {
  fn encode(s: &SubjectProgress) -> Result<Self> {
    Ok(Self {
      subject_key:           s.key(),
      subject:               s.subject.clone(),
      total_correct_answers: encode_count(
        s.total_correct_answers,
        "total_correct_answers",
      )?,
      sessions_completed:    encode_count(s.sessions_completed, "sessions_completed")?,
      average_success_rate:  s.average_success_rate,
    })
  }

  fn into_subject(self) -> Result<SubjectProgress> {
    Ok(SubjectProgress {
      subject:               self.subject,
      total_correct_answers: decode_count(
        self.total_correct_answers,
        "total_correct_answers",
      )?,
      sessions_completed:    decode_count(self.sessions_completed, "sessions_completed")?,
      average_success_rate:  self.average_success_rate,
    })
  }
}

/// A whole learner record as raw column values, ordered by position.
pub struct RawLearner {
  pub learner_key:                  String,
  pub learner_id:                   String,
  pub total_sessions_completed:     i64,
  pub overall_average_success_rate: f64,
  pub last_updated:                 String,
  pub sessions:                     Vec<RawSession>,
  pub subjects:                     Vec<RawSubject>,
}

impl RawLearner {
  pub fn encode(p: &LearnerProgress) -> Result<Self> {
    Ok(Self {
      learner_key:                  p.key(),
      learner_id:                   p.learner_id.clone(),
      total_sessions_completed:     encode_count(
        p.total_sessions_completed,
        "total_sessions_completed",
      )?,
      overall_average_success_rate: p.overall_average_success_rate,
      last_updated:                 encode_dt(p.last_updated),
      sessions:                     p
        .sessions
        .iter()
        .map(RawSession::encode)
        .collect::<Result<_>>()?,
      subjects:                     p
        .subjects
        .iter()
        .map(RawSubject::encode)
        .collect::<Result<_>>()?,
    })
  }

  pub fn into_progress(self) -> Result<LearnerProgress> {
    Ok(LearnerProgress {
      learner_id:                   self.learner_id,
      subjects:                     self
        .subjects
        .into_iter()
        .map(RawSubject::into_subject)
        .collect::<Result<_>>()?,
      sessions:                     self
        .sessions
        .into_iter()
        .map(RawSession::into_session)
        .collect::<Result<_>>()?,
      total_sessions_completed:     decode_count(
        self.total_sessions_completed,
        "total_sessions_completed",
      )?,
      overall_average_success_rate: self.overall_average_success_rate,
      last_updated:                 decode_dt(&self.last_updated)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn negative_counts_are_rejected() {
    let err = decode_count::<u64>(-1, "sessions_completed").unwrap_err();
    assert!(matches!(err, Error::OutOfRange(ref m) if m.contains("sessions_completed")));
  }

  #[test]
  fn oversized_question_counts_are_rejected() {
    assert!(decode_count::<u32>(i64::from(u32::MAX) + 1, "total_questions").is_err());
    assert_eq!(decode_count::<u32>(7, "total_questions").unwrap(), 7);
  }

  #[test]
  fn huge_totals_do_not_wrap() {
    assert!(encode_count(u64::MAX, "total_correct_answers").is_err());
  }

  #[test]
  fn malformed_timestamp_is_an_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
