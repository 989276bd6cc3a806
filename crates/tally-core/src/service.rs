//! [`ProgressService`] records quiz completions and answers progress queries
//! on top of any [`ProgressStore`].
//!
//! Each completion is a read-modify-write of one learner's record. Writes for
//! the same learner are serialised through a per-learner async lock, so two
//! concurrent completions can never both start from the same base record.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  aggregate::{self, Completion},
  progress::{LearnerProgress, learner_key},
  store::ProgressStore,
};

type LearnerLock = Arc<tokio::sync::Mutex<()>>;

pub struct ProgressService<S> {
  store: Arc<S>,
  locks: Mutex<HashMap<String, LearnerLock>>,
}

impl<S: ProgressStore> ProgressService<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, locks: Mutex::new(HashMap::new()) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// The write lock for one learner. Entries nobody else holds are dropped on
  /// the way, so the map only keeps learners with writes in flight.
  fn learner_lock(&self, learner_id: &str) -> LearnerLock {
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    locks.entry(learner_key(learner_id)).or_default().clone()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Record one completed quiz for `learner_id` and return the updated record.
  ///
  /// The input is validated before anything is read or written. The new record
  /// is computed in memory and persisted with a single save; if that save
  /// fails, the stored record is unchanged.
  pub async fn record_completion(
    &self,
    learner_id: &str,
    subjects_covered: Vec<String>,
    correct_answers: i64,
    total_questions: i64,
  ) -> Result<LearnerProgress> {
    if learner_id.trim().is_empty() {
      return Err(ValidationError::BlankLearnerId.into());
    }
    let completion =
      Completion::new(subjects_covered, correct_answers, total_questions)?;

    let lock = self.learner_lock(learner_id);
    let _guard = lock.lock().await;

    let now = Utc::now();
    let current = self
      .store
      .load(learner_id)
      .await
      .map_err(Error::storage)?
      .unwrap_or_else(|| LearnerProgress::empty(learner_id, now));

    let subjects = completion.subjects_covered.join(", ");
    let updated = aggregate::apply(current, completion, Uuid::new_v4(), now);

    self.store.save(&updated).await.map_err(|e| {
      tracing::error!(learner = learner_id, error = %e, "failed to save progress");
      Error::storage(e)
    })?;

    if let Some(session) = updated.sessions.last() {
      tracing::info!(
        learner = learner_id,
        countries = %subjects,
        correct = session.correct_answers,
        total = session.total_questions,
        success_rate = session.success_rate,
        "recorded quiz completion"
      );
    }

    Ok(updated)
  }

  /// Delete everything recorded for `learner_id`. Succeeds whether or not a
  /// record existed.
  pub async fn reset_progress(&self, learner_id: &str) -> Result<()> {
    let lock = self.learner_lock(learner_id);
    let _guard = lock.lock().await;

    let existed = self.store.delete(learner_id).await.map_err(|e| {
      tracing::error!(learner = learner_id, error = %e, "failed to reset progress");
      Error::storage(e)
    })?;

    if existed {
      tracing::info!(learner = learner_id, "reset progress");
    }
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// A learner's record, or `None` if they have no history yet.
  pub async fn get_progress(
    &self,
    learner_id: &str,
  ) -> Result<Option<LearnerProgress>> {
    let progress = self.store.load(learner_id).await.map_err(Error::storage)?;
    if progress.is_none() {
      tracing::debug!(learner = learner_id, "no progress recorded");
    }
    Ok(progress)
  }

  pub async fn has_progress(&self, learner_id: &str) -> Result<bool> {
    Ok(self.get_progress(learner_id).await?.is_some())
  }

  /// Every learner's record. A store that cannot be read yields an empty list.
  pub async fn get_all_progress(&self) -> Vec<LearnerProgress> {
    match self.store.list_all().await {
      Ok(all) => {
        tracing::debug!(count = all.len(), "loaded all progress");
        all
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to list progress");
        Vec::new()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use super::*;

  // ─── Test stores ─────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("store unavailable")]
  struct Unavailable;

  /// Keeps records in a map. Yields between steps so racing writers interleave.
  #[derive(Default)]
  struct MemoryStore {
    records:    Mutex<HashMap<String, LearnerProgress>>,
    fail_saves: AtomicBool,
    fail_reads: AtomicBool,
  }

  impl ProgressStore for MemoryStore {
    type Error = Unavailable;

    async fn load(&self, learner_id: &str) -> Result<Option<LearnerProgress>, Unavailable> {
      if self.fail_reads.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      let found = self.records.lock().unwrap().get(&learner_key(learner_id)).cloned();
      tokio::task::yield_now().await;
      Ok(found)
    }

    async fn save(&self, progress: &LearnerProgress) -> Result<(), Unavailable> {
      tokio::task::yield_now().await;
      if self.fail_saves.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      self.records.lock().unwrap().insert(progress.key(), progress.clone());
      Ok(())
    }

    async fn delete(&self, learner_id: &str) -> Result<bool, Unavailable> {
      Ok(self.records.lock().unwrap().remove(&learner_key(learner_id)).is_some())
    }

    async fn list_all(&self) -> Result<Vec<LearnerProgress>, Unavailable> {
      if self.fail_reads.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      Ok(self.records.lock().unwrap().values().cloned().collect())
    }
  }

  fn service() -> ProgressService<MemoryStore> {
    ProgressService::new(Arc::new(MemoryStore::default()))
  }

  fn subjects(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  // ─── Recording ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_completion_creates_record() {
    let svc = service();
    assert!(svc.get_progress("sam").await.unwrap().is_none());

    let p = svc
      .record_completion("sam", subjects(&["France", "Germany"]), 4, 5)
      .await
      .unwrap();
    assert_eq!(p.learner_id, "sam");
    assert_eq!(p.total_sessions_completed, 1);
    assert_eq!(p.overall_average_success_rate, 80.0);

    let stored = svc.get_progress("sam").await.unwrap().unwrap();
    assert_eq!(stored, p);
    assert!(svc.has_progress("SAM").await.unwrap());
  }

  #[tokio::test]
  async fn learner_ids_ignore_case() {
    let svc = service();
    svc.record_completion("Sam", subjects(&["Peru"]), 1, 2).await.unwrap();
    let p = svc.record_completion("SAM", subjects(&["peru"]), 2, 2).await.unwrap();

    assert_eq!(p.learner_id, "Sam");
    assert_eq!(p.total_sessions_completed, 2);
    assert_eq!(p.subjects.len(), 1);
    assert_eq!(p.subjects[0].sessions_completed, 2);
    assert_eq!(svc.get_all_progress().await.len(), 1);
  }

  #[tokio::test]
  async fn invalid_input_records_nothing() {
    let svc = service();
    svc.record_completion("sam", subjects(&["A"]), 1, 5).await.unwrap();
    let before = svc.get_progress("sam").await.unwrap();

    for (names, correct, total) in [(vec![], 3, 5), (vec!["A"], 6, 5), (vec!["A"], 3, 0)] {
      let err = svc
        .record_completion("sam", subjects(&names), correct, total)
        .await
        .unwrap_err();
      assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    assert_eq!(svc.get_progress("sam").await.unwrap(), before);
  }

  #[tokio::test]
  async fn blank_learner_is_rejected() {
    let svc = service();
    let err = svc
      .record_completion("  ", subjects(&["A"]), 1, 1)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::BlankLearnerId)));
  }

  #[tokio::test]
  async fn failed_save_leaves_record_unchanged() {
    let svc = service();
    svc.record_completion("sam", subjects(&["A"]), 1, 5).await.unwrap();
    let before = svc.get_progress("sam").await.unwrap();

    svc.store().fail_saves.store(true, Ordering::SeqCst);
    let err = svc
      .record_completion("sam", subjects(&["B"]), 5, 5)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    svc.store().fail_saves.store(false, Ordering::SeqCst);
    assert_eq!(svc.get_progress("sam").await.unwrap(), before);
  }

  #[tokio::test]
  async fn concurrent_completions_are_all_kept() {
    let svc = Arc::new(service());
    let mut handles = Vec::new();
    for i in 0..16 {
      let svc = svc.clone();
      handles.push(tokio::spawn(async move {
        svc
          .record_completion("sam", subjects(&["A", "B"]), i % 6, 5)
          .await
          .unwrap();
      }));
    }
    for h in handles {
      h.await.unwrap();
    }

    let p = svc.get_progress("sam").await.unwrap().unwrap();
    assert_eq!(p.sessions.len(), 16);
    assert_eq!(p.total_sessions_completed, 16);
    assert_eq!(p.subject("a").unwrap().sessions_completed, 16);
  }

  // ─── Reset ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reset_is_idempotent() {
    let svc = service();
    svc.reset_progress("nobody").await.unwrap();
    assert!(svc.get_progress("nobody").await.unwrap().is_none());

    svc.record_completion("sam", subjects(&["A"]), 1, 1).await.unwrap();
    svc.reset_progress("SAM").await.unwrap();
    svc.reset_progress("sam").await.unwrap();
    assert!(svc.get_progress("sam").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn recording_after_reset_starts_fresh() {
    let svc = service();
    svc.record_completion("sam", subjects(&["A"]), 0, 1).await.unwrap();
    svc.reset_progress("sam").await.unwrap();

    let p = svc.record_completion("sam", subjects(&["B"]), 1, 1).await.unwrap();
    assert_eq!(p.total_sessions_completed, 1);
    assert!(p.subject("A").is_none());
    assert_eq!(p.overall_average_success_rate, 100.0);
  }

  // ─── Listing ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn all_progress_lists_every_learner() {
    let svc = service();
    assert!(svc.get_all_progress().await.is_empty());

    svc.record_completion("sam", subjects(&["A"]), 1, 1).await.unwrap();
    svc.record_completion("alex", subjects(&["B"]), 1, 1).await.unwrap();

    let mut names: Vec<_> =
      svc.get_all_progress().await.into_iter().map(|p| p.learner_id).collect();
    names.sort();
    assert_eq!(names, vec!["alex", "sam"]);
  }

  #[tokio::test]
  async fn unreadable_store_lists_nothing() {
    let svc = service();
    svc.record_completion("sam", subjects(&["A"]), 1, 1).await.unwrap();
    svc.store().fail_reads.store(true, Ordering::SeqCst);
    assert!(svc.get_all_progress().await.is_empty());
  }

  #[test]
  fn idle_locks_are_dropped() {
    let svc = service();
    let held = svc.learner_lock("sam");
    let _ = svc.learner_lock("alex");
    let _ = svc.learner_lock("kim");

    let locks = svc.locks.lock().unwrap();
    assert!(locks.contains_key("sam"));
    assert!(!locks.contains_key("alex"));
    drop(held);
  }
}
