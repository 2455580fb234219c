//! Feed storage - topics and their append-only content items.
//!
//! Two backends implement the same trait: SQLite (primary) and a
//! single-document JSON file (local/dev fallback).

mod json;
mod sqlite;
mod types;

pub use json::JsonStore;
pub use sqlite::SqliteStore;
pub use types::*;

/// Trait for feed storage backends.
///
/// Items are append-only and immutable. `list_items` returns the total
/// order `(created_at, seq)` ascending; callers slice pages out of it.
pub trait FeedStore: Send + Sync {
    /// Create a topic. The caller is responsible for slug uniqueness
    /// (probe with [`FeedStore::is_slug_taken`] first).
    fn create_topic(
        &self,
        slug: &str,
        title: &str,
        prompt_template: &str,
    ) -> Result<Topic, StoreError>;

    /// Look up a topic by its slug.
    fn topic_by_slug(&self, slug: &str) -> Result<Option<Topic>, StoreError>;

    /// Check whether a slug is already in use.
    fn is_slug_taken(&self, slug: &str) -> Result<bool, StoreError>;

    /// All items for a topic, chronological ascending (ties broken by
    /// insertion order).
    fn list_items(&self, topic_id: &str) -> Result<Vec<ContentItem>, StoreError>;

    /// Number of stored items for a topic.
    fn count_items(&self, topic_id: &str) -> Result<u64, StoreError>;

    /// Append a batch of items. The store assigns id, timestamp and
    /// sequence number; returns the inserted rows in insertion order.
    fn append_items(&self, items: &[NewContentItem]) -> Result<Vec<ContentItem>, StoreError>;

    /// Most recently created topics with preview content and item count.
    fn recent_topics(&self, limit: u32) -> Result<Vec<TopicSummary>, StoreError>;
}
