//! The `ProgressStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! [`ProgressService`](crate::service::ProgressService) and the HTTP layer
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::progress::LearnerProgress;

/// Durable storage holding one [`LearnerProgress`] record per learner.
///
/// Learner ids are matched case-insensitively (see
/// [`learner_key`](crate::progress::learner_key)). A `save` must replace the
/// stored record atomically: a failed write leaves the previous record intact.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ProgressStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a learner's record. Returns `None` if nothing was recorded yet.
  fn load<'a>(
    &'a self,
    learner_id: &'a str,
  ) -> impl Future<Output = Result<Option<LearnerProgress>, Self::Error>> + Send + 'a;

  /// Persist `progress`, replacing any record stored for the same learner.
  fn save<'a>(
    &'a self,
    progress: &'a LearnerProgress,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a learner's record. Returns whether a record existed.
  fn delete<'a>(
    &'a self,
    learner_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every stored record, in no particular order.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<LearnerProgress>, Self::Error>> + Send + '_;
}
