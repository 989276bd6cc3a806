//! [`JsonDirectory`], a [`LearnerDirectory`] read once from a JSON file.
//!
//! The file looks like:
//!
//! ```json
//! { "children": [
//!   { "nickname": "sam", "name": "Sam Lee", "age": 9,
//!     "preferredDifficulty": "medium", "preferredQuizLength": 10,
//!     "topicsOfInterest": ["Europe"] }
//! ] }
//! ```

use std::path::Path;

use serde::Deserialize;
use tally_core::directory::{
  LearnerDirectory, LearnerPreferences, LearnerProfile,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
  #[error("failed to read learner directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed learner directory: {0}")]
  Json(#[from] serde_json::Error),
}

fn default_difficulty() -> String { "easy".to_owned() }

fn default_quiz_length() -> u32 { 5 }

/// One learner entry in the directory file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
  pub nickname:              String,
  pub name:                  String,
  pub age:                   u32,
  #[serde(default = "default_difficulty")]
  pub preferred_difficulty:  String,
  #[serde(default = "default_quiz_length")]
  pub preferred_quiz_length: u32,
  #[serde(default)]
  pub topics_of_interest:    Vec<String>,
}

#[derive(Deserialize)]
struct DirectoryFile {
  #[serde(default)]
  children: Vec<Child>,
}

/// An immutable, in-memory learner directory.
#[derive(Debug, Clone, Default)]
pub struct JsonDirectory {
  children: Vec<Child>,
}

impl JsonDirectory {
  pub fn new(children: Vec<Child>) -> Self { Self { children } }

  /// Parse a directory from its JSON text.
  pub fn from_json(text: &str) -> Result<Self, DirectoryError> {
    let file: DirectoryFile = serde_json::from_str(text)?;
    Ok(Self::new(file.children))
  }

  /// Read and parse the directory file at `path`.
  pub async fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await?;
    let directory = Self::from_json(&text)?;
    tracing::info!(
      path = %path.display(),
      count = directory.children.len(),
      "loaded learner directory"
    );
    Ok(directory)
  }

  fn find(&self, nickname: &str) -> Option<&Child> {
    let key = tally_core::progress::learner_key(nickname);
    self
      .children
      .iter()
      .find(|c| tally_core::progress::learner_key(&c.nickname) == key)
  }
}

impl LearnerDirectory for JsonDirectory {
  fn list(&self) -> Vec<String> {
    self.children.iter().map(|c| c.nickname.clone()).collect()
  }

  fn get_profile(&self, learner_id: &str) -> Option<LearnerProfile> {
    self.find(learner_id).map(|c| LearnerProfile {
      name: c.name.clone(),
      age:  c.age,
    })
  }

  fn get_preferences(&self, learner_id: &str) -> Option<LearnerPreferences> {
    self.find(learner_id).map(|c| LearnerPreferences {
      preferred_difficulty:  c.preferred_difficulty.clone(),
      preferred_quiz_length: c.preferred_quiz_length,
      topics_of_interest:    c.topics_of_interest.clone(),
    })
  }
}
