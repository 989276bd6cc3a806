//! The learner directory: who may record quizzes and what we know about them.
//!
//! The directory is owned by the caller (the HTTP layer checks it before
//! recording anything). The progress engine itself never consults it.

use serde::{Deserialize, Serialize};

/// Public profile of a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
  pub name: String,
  pub age:  u32,
}

/// Quiz preferences of a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerPreferences {
  pub preferred_difficulty:  String,
  pub preferred_quiz_length: u32,
  pub topics_of_interest:    Vec<String>,
}

/// Read-only lookup of known learners, matched case-insensitively by nickname.
pub trait LearnerDirectory: Send + Sync {
  /// Nicknames of every known learner.
  fn list(&self) -> Vec<String>;

  fn get_profile(&self, learner_id: &str) -> Option<LearnerProfile>;

  fn get_preferences(&self, learner_id: &str) -> Option<LearnerPreferences>;

  fn exists(&self, learner_id: &str) -> bool {
    self.get_profile(learner_id).is_some()
  }
}
