//! Per-topic request coordination: rate limiting and the single-flight
//! generation lock.
//!
//! Both live behind one trait so the process-local implementation can be
//! swapped for a shared backing (cache, distributed lock) without touching
//! the pagination logic. The local implementation is explicitly not safe
//! across multiple server instances.

mod local;

pub use local::LocalCoordinator;

use async_trait::async_trait;

/// Outcome of a generation lock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The caller now holds the lock and must call
    /// [`Coordinator::end_generation`] when done.
    Acquired,
    /// Another generation for this key is in flight and still fresh.
    Busy,
}

/// Error type for coordination operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Trait for per-key request coordination.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Count one call against the key's rate window.
    ///
    /// Returns `Err(RateLimited)` when the window budget is exhausted;
    /// otherwise increments the counter (resetting the window first if it
    /// has elapsed).
    async fn check_rate(&self, key: &str) -> Result<(), CoordinationError>;

    /// Try to take the generation lock for the key.
    ///
    /// A lock held longer than the configured timeout is treated as
    /// abandoned and taken over.
    async fn begin_generation(&self, key: &str) -> LockOutcome;

    /// Release the generation lock for the key.
    async fn end_generation(&self, key: &str);
}
