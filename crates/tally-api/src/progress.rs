//! Handlers for progress endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/kids/{nickname}/progress` | Placeholder body when nothing is recorded |
//! | `GET`    | `/progress/all` | Every learner's record |
//! | `POST`   | `/kids/{nickname}/quiz-completion` | Body: [`QuizCompletionBody`] |
//! | `DELETE` | `/kids/{nickname}/progress` | Idempotent reset |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_core::{
  directory::LearnerDirectory,
  progress::LearnerProgress,
  store::ProgressStore,
};

use crate::{AppState, error::ApiError};

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /kids/{nickname}/progress`
///
/// A learner with no history gets a `200` with an empty summary rather than a
/// `404`; having no progress yet is not an error.
pub async fn get_one<S, D>(
  State(state): State<AppState<S, D>>,
  Path(nickname): Path<String>,
) -> Result<Response, ApiError>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  let progress = state
    .progress
    .get_progress(&nickname)
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to load progress"))?;

  Ok(match progress {
    Some(p) => Json(p).into_response(),
    None => Json(json!({
      "nickname": nickname,
      "message": "No progress data found yet",
      "countries": [],
      "totalQuizzesCompleted": 0,
    }))
    .into_response(),
  })
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllProgressBody {
  pub total_kids: usize,
  pub progress:   Vec<LearnerProgress>,
}

/// `GET /progress/all`
pub async fn list_all<S, D>(
  State(state): State<AppState<S, D>>,
) -> Json<AllProgressBody>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  let progress = state.progress.get_all_progress().await;
  Json(AllProgressBody { total_kids: progress.len(), progress })
}

// ─── Record ───────────────────────────────────────────────────────────────────

fn default_total_questions() -> i64 { 5 }

/// JSON body accepted by `POST /kids/{nickname}/quiz-completion`.
///
/// Counts are signed so that negative input reaches validation and gets a
/// descriptive `400` instead of a deserialisation failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCompletionBody {
  #[serde(default)]
  pub countries_covered: Vec<String>,
  #[serde(default)]
  pub correct_answers:   i64,
  #[serde(default = "default_total_questions")]
  pub total_questions:   i64,
}

#[derive(Debug, Serialize)]
pub struct RecordedBody {
  pub message:  &'static str,
  pub progress: LearnerProgress,
}

/// `POST /kids/{nickname}/quiz-completion`: 404 for unknown learners, 400
/// for a malformed body or invalid input, otherwise the updated record.
pub async fn record<S, D>(
  State(state): State<AppState<S, D>>,
  Path(nickname): Path<String>,
  body: Result<Json<QuizCompletionBody>, JsonRejection>,
) -> Result<Json<RecordedBody>, ApiError>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  if !state.directory.exists(&nickname) {
    return Err(ApiError::unknown_learner(&nickname));
  }
  let Json(body) = body?;

  let progress = state
    .progress
    .record_completion(
      &nickname,
      body.countries_covered,
      body.correct_answers,
      body.total_questions,
    )
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to record quiz completion"))?;

  Ok(Json(RecordedBody {
    message: "Quiz completion recorded successfully",
    progress,
  }))
}

// ─── Reset ────────────────────────────────────────────────────────────────────

/// `DELETE /kids/{nickname}/progress`
pub async fn reset<S, D>(
  State(state): State<AppState<S, D>>,
  Path(nickname): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  if !state.directory.exists(&nickname) {
    return Err(ApiError::unknown_learner(&nickname));
  }

  state
    .progress
    .reset_progress(&nickname)
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to reset progress"))?;

  Ok(Json(json!({ "message": format!("Progress reset for kid '{nickname}'") })))
}
