//! SQLite-backed feed store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    ContentItem, FeedStore, NewContentItem, SizeClass, SourceRef, StoreError, Topic, TopicSummary,
};

/// SQLite-backed feed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and initialize tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- User-defined topics (one row per slug)
            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                prompt_template TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_topics_created ON topics(created_at);

            -- Append-only generated content; seq is the insertion-order
            -- tie-break for identical timestamps
            CREATE TABLE IF NOT EXISTS content_items (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                topic_id TEXT NOT NULL REFERENCES topics(id),
                content TEXT NOT NULL,
                sources TEXT NOT NULL DEFAULT '[]',
                size_class TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_content_items_topic
                ON content_items(topic_id, created_at, seq);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_topic(row: &rusqlite::Row) -> rusqlite::Result<Topic> {
        let created_at_str: String = row.get(4)?;
        Ok(Topic {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            prompt_template: row.get(3)?,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ContentItem> {
        let sources_json: String = row.get(4)?;
        let size_class_str: String = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        Ok(ContentItem {
            seq: row.get(0)?,
            id: row.get(1)?,
            topic_id: row.get(2)?,
            content: row.get(3)?,
            sources: serde_json::from_str(&sources_json).unwrap_or_default(),
            size_class: parse_size_class(&size_class_str),
            created_at: parse_timestamp(&created_at_str),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_size_class(s: &str) -> SizeClass {
    match s {
        "detailed" => SizeClass::Detailed,
        _ => SizeClass::Short,
    }
}

fn size_class_str(class: SizeClass) -> &'static str {
    match class {
        SizeClass::Short => "short",
        SizeClass::Detailed => "detailed",
    }
}

impl FeedStore for SqliteStore {
    fn create_topic(
        &self,
        slug: &str,
        title: &str,
        prompt_template: &str,
    ) -> Result<Topic, StoreError> {
        let conn = self.conn.lock().unwrap();
        let topic = Topic {
            id: uuid::Uuid::new_v4().to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            prompt_template: prompt_template.to_string(),
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO topics (id, slug, title, prompt_template, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                &topic.id,
                &topic.slug,
                &topic.title,
                &topic.prompt_template,
                topic.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(topic)
    }

    fn topic_by_slug(&self, slug: &str) -> Result<Option<Topic>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, slug, title, prompt_template, created_at FROM topics WHERE slug = ?",
            params![slug],
            Self::row_to_topic,
        );

        match result {
            Ok(topic) => Ok(Some(topic)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn is_slug_taken(&self, slug: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let taken: bool = conn
            .query_row(
                "SELECT 1 FROM topics WHERE slug = ?",
                params![slug],
                |_| Ok(true),
            )
            .unwrap_or(false);
        Ok(taken)
    }

    fn list_items(&self, topic_id: &str) -> Result<Vec<ContentItem>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT seq, id, topic_id, content, sources, size_class, created_at
                 FROM content_items WHERE topic_id = ?
                 ORDER BY created_at ASC, seq ASC",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![topic_id], Self::row_to_item)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(items)
    }

    fn count_items(&self, topic_id: &str) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM content_items WHERE topic_id = ?",
            params![topic_id],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn append_items(&self, items: &[NewContentItem]) -> Result<Vec<ContentItem>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut inserted = Vec::with_capacity(items.len());

        for item in items {
            let id = uuid::Uuid::new_v4().to_string();
            let created_at = Utc::now();
            let sources_json = serde_json::to_string(&item.sources)
                .map_err(|e| StoreError::Database(e.to_string()))?;

            conn.execute(
                "INSERT INTO content_items (id, topic_id, content, sources, size_class, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    &id,
                    &item.topic_id,
                    &item.content,
                    &sources_json,
                    size_class_str(item.size_class),
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

            let seq = conn.last_insert_rowid();
            inserted.push(ContentItem {
                id,
                topic_id: item.topic_id.clone(),
                content: item.content.clone(),
                sources: item.sources.clone(),
                size_class: item.size_class,
                created_at,
                seq,
            });
        }

        Ok(inserted)
    }

    fn recent_topics(&self, limit: u32) -> Result<Vec<TopicSummary>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, slug, title, prompt_template, created_at FROM topics
                 ORDER BY created_at DESC, rowid DESC LIMIT ?",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_topic)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut topics = Vec::new();
        for row in rows {
            topics.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }

        let mut summaries = Vec::with_capacity(topics.len());
        for topic in topics {
            let preview: Option<String> = conn
                .query_row(
                    "SELECT content FROM content_items WHERE topic_id = ?
                     ORDER BY created_at ASC, seq ASC LIMIT 1",
                    params![&topic.id],
                    |row| row.get(0),
                )
                .ok();

            let item_count: u64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM content_items WHERE topic_id = ?",
                    params![&topic.id],
                    |row| row.get(0),
                )
                .map_err(|e| StoreError::Database(e.to_string()))?;

            summaries.push(TopicSummary {
                id: topic.id,
                slug: topic.slug,
                title: topic.title,
                preview_content: preview,
                item_count,
            });
        }

        Ok(summaries)
    }
}
