//! The progress aggregator: folds one quiz completion into a learner's record.
//!
//! Everything here is synchronous and storage-free. The caller supplies the
//! current record (or an empty one), the session id and the clock; the result
//! is the complete new record, ready to be written in a single save.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  ValidationError,
  progress::{LearnerProgress, QuizSession, subject_key},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// A validated quiz-completion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
  pub subjects_covered: Vec<String>,
  pub correct_answers:  u32,
  pub total_questions:  u32,
}

impl Completion {
  /// Check the raw counts and subject list, in the order the API reports
  /// them: subjects first, then correct answers, then the question total.
  pub fn new(
    subjects_covered: Vec<String>,
    correct_answers: i64,
    total_questions: i64,
  ) -> Result<Self, ValidationError> {
    if subjects_covered.is_empty() {
      return Err(ValidationError::NoSubjects);
    }
    if subjects_covered.iter().any(|s| s.trim().is_empty()) {
      return Err(ValidationError::BlankSubject);
    }
    if correct_answers < 0 {
      return Err(ValidationError::NegativeCorrectAnswers(correct_answers));
    }
    if total_questions <= 0 {
      return Err(ValidationError::NonPositiveTotalQuestions(total_questions));
    }
    if correct_answers > total_questions {
      return Err(ValidationError::CorrectExceedsTotal {
        correct: correct_answers,
        total:   total_questions,
      });
    }
    let total_questions = u32::try_from(total_questions)
      .map_err(|_| ValidationError::CountOutOfRange(total_questions))?;
    // Bounded by `total_questions` above.
    let correct_answers = correct_answers as u32;

    Ok(Self { subjects_covered, correct_answers, total_questions })
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Percentage of correct answers; 0 when there were no questions.
pub fn success_rate(correct_answers: u32, total_questions: u32) -> f64 {
  if total_questions == 0 {
    return 0.0;
  }
  f64::from(correct_answers) * 100.0 / f64::from(total_questions)
}

/// Drop case-insensitive duplicates, keeping the first spelling of each.
pub fn distinct_subjects(subjects: &[String]) -> Vec<&str> {
  let mut seen = Vec::<String>::new();
  let mut out = Vec::new();
  for s in subjects {
    let key = subject_key(s);
    if !seen.contains(&key) {
      seen.push(key);
      out.push(s.as_str());
    }
  }
  out
}

/// Correct answers credited to each of `distinct` subjects. Truncating; the
/// remainder is credited to none of them.
pub fn subject_share(correct_answers: u32, distinct: usize) -> u64 {
  // A validated completion always has at least one subject.
  let divisor = u64::try_from(distinct.max(1)).unwrap_or(u64::MAX);
  u64::from(correct_answers) / divisor
}

/// Arithmetic mean, summed in iteration order; 0 for an empty input.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
  let (sum, count) = values.fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
  if count == 0 { 0.0 } else { sum / count as f64 }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Record `completion` against `progress` and return the updated record.
///
/// Correct answers are split evenly over the distinct subjects with truncating
/// division, so `5` correct over three subjects adds `1` to each and the
/// remaining `2` are not credited to any subject.
pub fn apply(
  mut progress: LearnerProgress,
  completion: Completion,
  session_id: Uuid,
  now: DateTime<Utc>,
) -> LearnerProgress {
  let Completion { subjects_covered, correct_answers, total_questions } =
    completion;

  let distinct: Vec<String> = distinct_subjects(&subjects_covered)
    .into_iter()
    .map(str::to_owned)
    .collect();
  let per_subject = subject_share(correct_answers, distinct.len());

  progress.sessions.push(QuizSession {
    session_id,
    subjects_covered,
    timestamp: now,
    total_questions,
    correct_answers,
    success_rate: success_rate(correct_answers, total_questions),
  });

  for subject in &distinct {
    let entry = progress.subject_mut_or_insert(subject);
    entry.sessions_completed += 1;
    entry.total_correct_answers += per_subject;
  }

  recompute_averages(&mut progress);
  progress.total_sessions_completed += 1;
  progress.last_updated = now;
  progress
}

/// Recompute every derived average from the full session history.
pub fn recompute_averages(progress: &mut LearnerProgress) {
  let sessions = &progress.sessions;
  for subject in &mut progress.subjects {
    let key = subject.key();
    subject.average_success_rate = mean(
      sessions
        .iter()
        .filter(|s| s.covers(&key))
        .map(|s| s.success_rate),
    );
  }
  progress.overall_average_success_rate =
    mean(sessions.iter().map(|s| s.success_rate));
}
