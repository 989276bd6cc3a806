//! Core types and trait definitions for Tally quiz progress tracking.
//!
//! This crate holds the progress model, the aggregation rules and the storage
//! seam. It is free of HTTP and database dependencies; the other crates depend
//! on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod directory;
pub mod error;
pub mod progress;
pub mod service;
pub mod store;

pub use error::{Error, Result, ValidationError};
