//! Feed pagination: topic creation, slug derivation, and the
//! read-or-generate page loop.

mod paginator;
mod slug;

pub use paginator::FeedPaginator;
pub use slug::slugify;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the feed paginator.
///
/// Generator failures never appear here; they are absorbed by the
/// pipeline's fallback path.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
