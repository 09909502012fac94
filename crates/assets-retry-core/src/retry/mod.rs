//! Retry decisions and failure classification.
//!
//! This module holds what both controllers share: the error types surfaced to
//! the page, the idempotent exhaustion annotation, chunk failure
//! classification, and the attempt-cap/delay decision.

mod classify;
mod error;
mod policy;

pub use classify::{classify, FailureClass};
pub use error::{annotate_exhausted, ChunkLoadError, ResolutionError, ResourceLoadError};
pub use policy::{decide, is_exhausted, wait, RetryDecision};
