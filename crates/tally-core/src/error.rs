//! Error types for `tally-core`.

use thiserror::Error;

/// A quiz completion that breaks one of the input constraints. Nothing is
/// recorded when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("learner id must not be blank")]
  BlankLearnerId,

  #[error("countries covered must contain at least one country")]
  NoSubjects,

  #[error("country names must not be blank")]
  BlankSubject,

  #[error("correct answers must be a non-negative number, got {0}")]
  NegativeCorrectAnswers(i64),

  #[error("total questions must be greater than 0, got {0}")]
  NonPositiveTotalQuestions(i64),

  #[error("correct answers ({correct}) cannot exceed total questions ({total})")]
  CorrectExceedsTotal { correct: i64, total: i64 },

  #[error("question count {0} is out of range")]
  CountOutOfRange(i64),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from a [`ProgressStore`](crate::store::ProgressStore).
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
