//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`ProgressStore`] and
//! [`LearnerDirectory`]. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = AppState::new(Arc::new(store), Arc::new(directory));
//! axum::serve(listener, tally_api::router(state)).await?;
//! ```

pub mod directory;
pub mod error;
pub mod kids;
pub mod progress;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde_json::{Value, json};
use tally_core::{
  directory::LearnerDirectory,
  service::ProgressService,
  store::ProgressStore,
};
use tower_http::trace::TraceLayer;

pub use directory::JsonDirectory;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, D> {
  pub progress:  Arc<ProgressService<S>>,
  pub directory: Arc<D>,
}

impl<S: ProgressStore, D: LearnerDirectory> AppState<S, D> {
  pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
    Self { progress: Arc::new(ProgressService::new(store)), directory }
  }
}

impl<S, D> Clone for AppState<S, D> {
  fn clone(&self) -> Self {
    Self {
      progress:  self.progress.clone(),
      directory: self.directory.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S, D>(state: AppState<S, D>) -> Router
where
  S: ProgressStore + 'static,
  D: LearnerDirectory + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Directory
    .route("/kids", get(kids::list::<S, D>))
    .route("/kids/{nickname}/profile", get(kids::profile::<S, D>))
    .route("/kids/{nickname}/preferences", get(kids::preferences::<S, D>))
    // Progress
    .route(
      "/kids/{nickname}/progress",
      get(progress::get_one::<S, D>).delete(progress::reset::<S, D>),
    )
    .route(
      "/kids/{nickname}/quiz-completion",
      post(progress::record::<S, D>),
    )
    .route("/progress/all", get(progress::list_all::<S, D>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
