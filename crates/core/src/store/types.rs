//! Types for feed storage (topics and content items).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user-defined subject driving content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Opaque id (uuid v4).
    pub id: String,
    /// Unique human-readable slug, derived from the title.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Free-text prompt seeding every generation call.
    pub prompt_template: String,
    /// When the topic was created.
    pub created_at: DateTime<Utc>,
}

/// Attribution for a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Display label (e.g. a site name).
    pub label: String,
    /// Link target.
    pub url: String,
}

/// Presentation size of a generated item.
///
/// Fixed once per generation batch so one scroll of content stays
/// visually consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    #[default]
    Short,
    Detailed,
}

/// One generated unit of feed content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Opaque id (uuid v4).
    pub id: String,
    /// Owning topic id.
    pub topic_id: String,
    /// Cleaned display text (may contain markdown / code fences).
    pub content: String,
    /// Zero or more attributions, in the order the generator returned them.
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Presentation size class.
    pub size_class: SizeClass,
    /// Creation timestamp - the primary ordering key.
    pub created_at: DateTime<Utc>,
    /// Store-assigned insertion counter, tie-break on equal `created_at`.
    pub seq: i64,
}

/// A content item about to be appended; the store assigns id, timestamp
/// and sequence number.
#[derive(Debug, Clone)]
pub struct NewContentItem {
    pub topic_id: String,
    pub content: String,
    pub sources: Vec<SourceRef>,
    pub size_class: SizeClass,
}

/// A topic summary for the trending listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Content of the topic's first item, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_content: Option<String>,
    /// Total stored items for the topic.
    pub item_count: u64,
}

/// Errors for feed storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),
}
