//! Handlers for `/kids` directory endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/kids` | Nicknames of every known learner |
//! | `GET`  | `/kids/{nickname}/profile` | 404 if unknown |
//! | `GET`  | `/kids/{nickname}/preferences` | 404 if unknown |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use tally_core::{
  directory::{LearnerDirectory, LearnerPreferences, LearnerProfile},
  store::ProgressStore,
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct KidsBody {
  pub kids: Vec<String>,
}

/// `GET /kids`
pub async fn list<S, D>(State(state): State<AppState<S, D>>) -> Json<KidsBody>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  Json(KidsBody { kids: state.directory.list() })
}

/// `GET /kids/{nickname}/profile`
pub async fn profile<S, D>(
  State(state): State<AppState<S, D>>,
  Path(nickname): Path<String>,
) -> Result<Json<LearnerProfile>, ApiError>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  state
    .directory
    .get_profile(&nickname)
    .map(Json)
    .ok_or_else(|| ApiError::unknown_learner(&nickname))
}

/// `GET /kids/{nickname}/preferences`
pub async fn preferences<S, D>(
  State(state): State<AppState<S, D>>,
  Path(nickname): Path<String>,
) -> Result<Json<LearnerPreferences>, ApiError>
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  state
    .directory
    .get_preferences(&nickname)
    .map(Json)
    .ok_or_else(|| ApiError::unknown_learner(&nickname))
}
