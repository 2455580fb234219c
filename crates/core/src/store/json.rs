//! JSON-file feed store for local development.
//!
//! The whole store is a single document `{topics: [...], items: [...]}`
//! rewritten wholesale on every mutation. No partial-write durability,
//! which is acceptable only as a dev fallback.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ContentItem, FeedStore, NewContentItem, StoreError, Topic, TopicSummary};

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    items: Vec<ContentItem>,
}

/// JSON-file feed store.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<JsonDocument>,
}

impl JsonStore {
    /// Open the store, loading the document if the file exists.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| StoreError::Io(format!("corrupt store document: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => JsonDocument::default(),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        Ok(Self {
            path,
            state: Mutex::new(doc),
        })
    }

    fn persist(&self, doc: &JsonDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(doc).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StoreError::Io(e.to_string()))
    }

    fn next_seq(doc: &JsonDocument) -> i64 {
        doc.items.iter().map(|i| i.seq).max().unwrap_or(0) + 1
    }
}

impl FeedStore for JsonStore {
    fn create_topic(
        &self,
        slug: &str,
        title: &str,
        prompt_template: &str,
    ) -> Result<Topic, StoreError> {
        let mut doc = self.state.lock().unwrap();
        let topic = Topic {
            id: uuid::Uuid::new_v4().to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            prompt_template: prompt_template.to_string(),
            created_at: Utc::now(),
        };
        doc.topics.push(topic.clone());
        self.persist(&doc)?;
        Ok(topic)
    }

    fn topic_by_slug(&self, slug: &str) -> Result<Option<Topic>, StoreError> {
        let doc = self.state.lock().unwrap();
        Ok(doc.topics.iter().find(|t| t.slug == slug).cloned())
    }

    fn is_slug_taken(&self, slug: &str) -> Result<bool, StoreError> {
        let doc = self.state.lock().unwrap();
        Ok(doc.topics.iter().any(|t| t.slug == slug))
    }

    fn list_items(&self, topic_id: &str) -> Result<Vec<ContentItem>, StoreError> {
        let doc = self.state.lock().unwrap();
        let mut items: Vec<ContentItem> = doc
            .items
            .iter()
            .filter(|i| i.topic_id == topic_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));
        Ok(items)
    }

    fn count_items(&self, topic_id: &str) -> Result<u64, StoreError> {
        let doc = self.state.lock().unwrap();
        Ok(doc.items.iter().filter(|i| i.topic_id == topic_id).count() as u64)
    }

    fn append_items(&self, items: &[NewContentItem]) -> Result<Vec<ContentItem>, StoreError> {
        let mut doc = self.state.lock().unwrap();
        let mut seq = Self::next_seq(&doc);
        let mut inserted = Vec::with_capacity(items.len());

        for item in items {
            let row = ContentItem {
                id: uuid::Uuid::new_v4().to_string(),
                topic_id: item.topic_id.clone(),
                content: item.content.clone(),
                sources: item.sources.clone(),
                size_class: item.size_class,
                created_at: Utc::now(),
                seq,
            };
            seq += 1;
            doc.items.push(row.clone());
            inserted.push(row);
        }

        self.persist(&doc)?;
        Ok(inserted)
    }

    fn recent_topics(&self, limit: u32) -> Result<Vec<TopicSummary>, StoreError> {
        let doc = self.state.lock().unwrap();
        let mut topics: Vec<&Topic> = doc.topics.iter().collect();
        topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(topics
            .into_iter()
            .take(limit as usize)
            .map(|topic| {
                let mut items: Vec<&ContentItem> = doc
                    .items
                    .iter()
                    .filter(|i| i.topic_id == topic.id)
                    .collect();
                items.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));

                TopicSummary {
                    id: topic.id.clone(),
                    slug: topic.slug.clone(),
                    title: topic.title.clone(),
                    preview_content: items.first().map(|i| i.content.clone()),
                    item_count: items.len() as u64,
                }
            })
            .collect())
    }
}
