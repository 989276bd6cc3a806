//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Internal failures carry only a caller-facing message; the underlying cause
/// is logged where it happens and never sent to the client.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(&'static str),
}

impl ApiError {
  /// Map a core error, using `failure` as the message for storage faults.
  pub fn from_core(e: tally_core::Error, failure: &'static str) -> Self {
    match e {
      tally_core::Error::Validation(v) => Self::BadRequest(v.to_string()),
      tally_core::Error::Storage(cause) => {
        tracing::error!(error = %cause, "{failure}");
        Self::Internal(failure)
      }
    }
  }

  pub fn unknown_learner(nickname: &str) -> Self {
    Self::NotFound(format!("Kid with nickname '{nickname}' not found"))
  }
}

/// A request body that is not valid JSON for the route is a plain `400`.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, (*m).to_owned()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
