//! Progress records: the per-learner aggregate and the sessions it is built
//! from.
//!
//! A learner's record keeps every completed quiz session in order, plus one
//! running entry per subject (country) those sessions touched. The averages on
//! both are derived from the session history, never accumulated.
//!
//! Serialised field names follow the wire format the quiz front-end expects
//! (`nickname`, `countries`, `quizSessions`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The normalised lookup key for a learner id. Learners are matched
/// case-insensitively everywhere: storage, locking and the learner directory.
pub fn learner_key(learner_id: &str) -> String { learner_id.to_lowercase() }

/// The normalised lookup key for a subject name.
pub fn subject_key(subject: &str) -> String { subject.to_lowercase() }

// ─── QuizSession ─────────────────────────────────────────────────────────────

/// One completed quiz attempt. Never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
  pub session_id:       Uuid,
  /// The subjects exactly as submitted, duplicates included.
  #[serde(rename = "countriesCovered")]
  pub subjects_covered: Vec<String>,
  /// Server-assigned completion time.
  #[serde(rename = "date")]
  pub timestamp:        DateTime<Utc>,
  pub total_questions:  u32,
  pub correct_answers:  u32,
  /// Percentage of correct answers, in `[0, 100]`.
  pub success_rate:     f64,
}

impl QuizSession {
  /// Whether this session touched the subject with the given normalised key.
  pub fn covers(&self, key: &str) -> bool {
    self.subjects_covered.iter().any(|s| subject_key(s) == key)
  }
}

// ─── SubjectProgress ─────────────────────────────────────────────────────────

/// Running totals for one subject within a learner's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
  /// The subject name as it was first recorded.
  #[serde(rename = "country")]
  pub subject:               String,
  pub total_correct_answers: u64,
  /// Number of sessions that covered this subject.
  pub sessions_completed:    u64,
  /// Mean success rate of the sessions that covered this subject.
  pub average_success_rate:  f64,
}

impl SubjectProgress {
  pub fn new(subject: impl Into<String>) -> Self {
    Self {
      subject:               subject.into(),
      total_correct_answers: 0,
      sessions_completed:    0,
      average_success_rate:  0.0,
    }
  }

  pub fn key(&self) -> String { subject_key(&self.subject) }
}

// ─── LearnerProgress ─────────────────────────────────────────────────────────

/// The aggregate root: everything recorded for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
  #[serde(rename = "nickname")]
  pub learner_id:                   String,
  /// One entry per distinct subject, in order of first appearance.
  #[serde(rename = "countries")]
  pub subjects:                     Vec<SubjectProgress>,
  /// Append-only, oldest first.
  #[serde(rename = "quizSessions")]
  pub sessions:                     Vec<QuizSession>,
  #[serde(rename = "totalQuizzesCompleted")]
  pub total_sessions_completed:     u64,
  pub overall_average_success_rate: f64,
  pub last_updated:                 DateTime<Utc>,
}

impl LearnerProgress {
  /// A record with no history, as used for a learner's first completion.
  pub fn empty(learner_id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      learner_id:                   learner_id.into(),
      subjects:                     Vec::new(),
      sessions:                     Vec::new(),
      total_sessions_completed:     0,
      overall_average_success_rate: 0.0,
      last_updated:                 now,
    }
  }

  pub fn key(&self) -> String { learner_key(&self.learner_id) }

  /// Look up a subject entry by name, ignoring case.
  pub fn subject(&self, name: &str) -> Option<&SubjectProgress> {
    let key = subject_key(name);
    self.subjects.iter().find(|s| s.key() == key)
  }

  pub(crate) fn subject_mut_or_insert(
    &mut self,
    name: &str,
  ) -> &mut SubjectProgress {
    let key = subject_key(name);
    let idx = match self.subjects.iter().position(|s| s.key() == key) {
      Some(idx) => idx,
      None => {
        self.subjects.push(SubjectProgress::new(name));
        self.subjects.len() - 1
      }
    };
    &mut self.subjects[idx]
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn session(subjects: &[&str]) -> QuizSession {
    QuizSession {
      session_id:       Uuid::new_v4(),
      subjects_covered: subjects.iter().map(|s| s.to_string()).collect(),
      timestamp:        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
      total_questions:  5,
      correct_answers:  4,
      success_rate:     80.0,
    }
  }

  #[test]
  fn covers_ignores_case() {
    let s = session(&["France", "GERMANY"]);
    assert!(s.covers("france"));
    assert!(s.covers("germany"));
    assert!(!s.covers("spain"));
  }

  #[test]
  fn subject_lookup_ignores_case() {
    let mut p = LearnerProgress::empty("Sam", Utc::now());
    p.subject_mut_or_insert("France").sessions_completed += 1;
    p.subject_mut_or_insert("FRANCE").sessions_completed += 1;

    assert_eq!(p.subjects.len(), 1);
    let france = p.subject("france").unwrap();
    assert_eq!(france.subject, "France");
    assert_eq!(france.sessions_completed, 2);
  }

  #[test]
  fn serialises_with_wire_field_names() {
    let mut p = LearnerProgress::empty("sam", Utc::now());
    p.sessions.push(session(&["France"]));
    p.subjects.push(SubjectProgress::new("France"));

    let v = serde_json::to_value(&p).unwrap();
    for field in [
      "nickname",
      "countries",
      "quizSessions",
      "totalQuizzesCompleted",
      "overallAverageSuccessRate",
      "lastUpdated",
    ] {
      assert!(v.get(field).is_some(), "missing {field}: {v}");
    }

    let subject = &v["countries"][0];
    for field in [
      "country",
      "totalCorrectAnswers",
      "sessionsCompleted",
      "averageSuccessRate",
    ] {
      assert!(subject.get(field).is_some(), "missing {field}: {subject}");
    }

    let s = &v["quizSessions"][0];
    for field in [
      "sessionId",
      "countriesCovered",
      "date",
      "totalQuestions",
      "correctAnswers",
      "successRate",
    ] {
      assert!(s.get(field).is_some(), "missing {field}: {s}");
    }
  }
}
