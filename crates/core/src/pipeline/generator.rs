//! The generation pipeline: prompt the generator, parse, dedup, classify,
//! persist.
//!
//! Generator-side failures never reach the caller; every one of them is
//! absorbed into the fallback-item path so the feed keeps moving. Only a
//! storage write failure propagates.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, LlmClient};
use crate::metrics::{
    GENERATION_BATCHES, GENERATION_DURATION, GENERATION_ITEMS_ACCEPTED, GENERATION_ITEMS_DEDUPED,
};
use crate::pipeline::parse::{parse_numbered_list, parse_structured};
use crate::pipeline::prompt::{build_system_prompt, build_user_prompt, wants_detailed};
use crate::pipeline::types::{PipelineConfig, RawGeneratedItem};
use crate::store::{ContentItem, FeedStore, NewContentItem, SizeClass, SourceRef, StoreError, Topic};

/// Upper bound of the random fallback suffix (exclusive).
const FALLBACK_SUFFIX_RANGE: u32 = 1000;

/// How a batch was obtained, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchOrigin {
    Structured,
    LegacyParse,
    Fallback,
}

impl BatchOrigin {
    fn label(self) -> &'static str {
        match self {
            BatchOrigin::Structured => "structured",
            BatchOrigin::LegacyParse => "legacy_parse",
            BatchOrigin::Fallback => "fallback",
        }
    }
}

/// Orchestrates one generation round for a topic.
pub struct GenerationPipeline {
    store: Arc<dyn FeedStore>,
    llm: Option<Arc<dyn LlmClient>>,
    config: PipelineConfig,
}

impl GenerationPipeline {
    /// Create a pipeline. `llm: None` means every batch is a fallback
    /// batch (generation degraded but never stalled).
    pub fn new(
        store: Arc<dyn FeedStore>,
        llm: Option<Arc<dyn LlmClient>>,
        config: PipelineConfig,
    ) -> Self {
        Self { store, llm, config }
    }

    /// Generate, clean and persist up to `requested_count` new items for
    /// the topic. Returns the rows actually inserted.
    pub async fn generate(
        &self,
        topic: &Topic,
        existing: &[ContentItem],
        requested_count: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let start = Instant::now();
        let existing_contents: HashSet<&str> =
            existing.iter().map(|item| item.content.as_str()).collect();

        let (raw_items, origin) = self.invoke_generator(topic, existing, requested_count).await;

        let (batch, origin) = match raw_items {
            Some(raw) => {
                let accepted = self.accept_batch(topic, raw, &existing_contents, requested_count);
                if accepted.is_empty() {
                    // Everything the generator returned was a duplicate or
                    // blank; degrade to fallback items.
                    debug!(topic = %topic.slug, "generator batch fully deduplicated, falling back");
                    (
                        self.fallback_batch(topic, &existing_contents, requested_count),
                        BatchOrigin::Fallback,
                    )
                } else {
                    (accepted, origin)
                }
            }
            None => (
                self.fallback_batch(topic, &existing_contents, requested_count),
                BatchOrigin::Fallback,
            ),
        };

        GENERATION_BATCHES.with_label_values(&[origin.label()]).inc();
        GENERATION_ITEMS_ACCEPTED
            .with_label_values(&[])
            .observe(batch.len() as f64);

        let inserted = self.store.append_items(&batch)?;
        GENERATION_DURATION
            .with_label_values(&[origin.label()])
            .observe(start.elapsed().as_secs_f64());

        info!(
            topic = %topic.slug,
            inserted = inserted.len(),
            origin = origin.label(),
            "generation round complete"
        );
        Ok(inserted)
    }

    /// Call the generator and parse its response. `None` means the
    /// fallback path must run.
    async fn invoke_generator(
        &self,
        topic: &Topic,
        existing: &[ContentItem],
        requested_count: usize,
    ) -> (Option<Vec<RawGeneratedItem>>, BatchOrigin) {
        let Some(llm) = &self.llm else {
            return (None, BatchOrigin::Fallback);
        };

        let detailed = wants_detailed(&topic.prompt_template);
        let request = CompletionRequest::new(build_user_prompt(
            &topic.prompt_template,
            existing,
            self.config.history_window,
            requested_count,
        ))
        .with_system(build_system_prompt(detailed))
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature);

        let text = match llm.complete(request).await {
            Ok(response) => response.text,
            Err(e) => {
                warn!(topic = %topic.slug, error = %e, "generator call failed");
                return (None, BatchOrigin::Fallback);
            }
        };

        if let Some(items) = parse_structured(&text) {
            return (Some(items), BatchOrigin::Structured);
        }

        let legacy = parse_numbered_list(&text);
        if !legacy.is_empty() {
            debug!(topic = %topic.slug, "structured parse failed, numbered-list fallback matched");
            return (Some(legacy), BatchOrigin::LegacyParse);
        }

        warn!(topic = %topic.slug, "generator response unparseable");
        (None, BatchOrigin::Fallback)
    }

    /// Trim, dedup and classify a raw batch. The size class is forced
    /// uniform: one detailed item makes the whole batch detailed.
    fn accept_batch(
        &self,
        topic: &Topic,
        raw: Vec<RawGeneratedItem>,
        existing_contents: &HashSet<&str>,
        requested_count: usize,
    ) -> Vec<NewContentItem> {
        let mut seen_in_batch: HashSet<String> = HashSet::new();
        let mut accepted: Vec<NewContentItem> = Vec::new();
        let mut deduped = 0u32;

        for item in raw {
            if accepted.len() >= requested_count {
                break;
            }

            let content = item.content.trim().to_string();
            if content.is_empty() {
                continue;
            }
            if existing_contents.contains(content.as_str()) || seen_in_batch.contains(&content) {
                deduped += 1;
                continue;
            }

            let sources = build_sources(&item);
            seen_in_batch.insert(content.clone());
            accepted.push(NewContentItem {
                topic_id: topic.id.clone(),
                size_class: self.classify(&content),
                content,
                sources,
            });
        }

        GENERATION_ITEMS_DEDUPED
            .with_label_values(&[])
            .observe(deduped as f64);

        if accepted
            .iter()
            .any(|item| item.size_class == SizeClass::Detailed)
        {
            for item in &mut accepted {
                item.size_class = SizeClass::Detailed;
            }
        }

        accepted
    }

    fn classify(&self, content: &str) -> SizeClass {
        if content.contains("```") || content.chars().count() > self.config.detailed_threshold_chars
        {
            SizeClass::Detailed
        } else {
            SizeClass::Short
        }
    }

    /// Synthesize `requested_count` placeholder items, each unique against
    /// the existing feed. Suffixes are retried on collision; an item that
    /// cannot be made unique within the attempt budget is dropped.
    fn fallback_batch(
        &self,
        topic: &Topic,
        existing_contents: &HashSet<&str>,
        requested_count: usize,
    ) -> Vec<NewContentItem> {
        let mut rng = rand::thread_rng();
        let mut seen_in_batch: HashSet<String> = HashSet::new();
        let mut batch = Vec::with_capacity(requested_count);

        for _ in 0..requested_count {
            let mut placed = false;
            for _ in 0..self.config.fallback_suffix_attempts {
                let content = format!(
                    "{} #{}",
                    topic.title,
                    rng.gen_range(0..FALLBACK_SUFFIX_RANGE)
                );
                if existing_contents.contains(content.as_str())
                    || seen_in_batch.contains(&content)
                {
                    continue;
                }
                seen_in_batch.insert(content.clone());
                batch.push(NewContentItem {
                    topic_id: topic.id.clone(),
                    content,
                    sources: Vec::new(),
                    size_class: SizeClass::Short,
                });
                placed = true;
                break;
            }
            if !placed {
                warn!(topic = %topic.slug, "fallback suffix space exhausted, emitting short batch");
            }
        }

        batch
    }
}

/// Turn the generator's optional attribution fields into source refs.
/// A bare title without a URL is not a link and is dropped.
fn build_sources(item: &RawGeneratedItem) -> Vec<SourceRef> {
    match item.source_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            let url = url.trim().to_string();
            let label = item
                .source_title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| domain_of(&url));
            vec![SourceRef { label, url }]
        }
        _ => Vec::new(),
    }
}

/// Best-effort host extraction for a source label.
fn domain_of(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    stripped
        .split('/')
        .next()
        .unwrap_or(stripped)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::testing::MockLlmClient;

    fn make_topic(store: &dyn FeedStore, prompt: &str) -> Topic {
        store.create_topic("test-topic", "Test Topic", prompt).unwrap()
    }

    fn pipeline_with(
        store: Arc<dyn FeedStore>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> GenerationPipeline {
        GenerationPipeline::new(store, llm, PipelineConfig::default())
    }

    fn structured_response(contents: &[&str]) -> String {
        let items: Vec<serde_json::Value> = contents
            .iter()
            .map(|c| serde_json::json!({"content": c, "source_title": null, "source_url": null}))
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[tokio::test]
    async fn test_structured_batch_persisted() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "GRE vocabulary");
        let llm = Arc::new(MockLlmClient::with_response(structured_response(&[
            "Aberration: a departure from what is normal.",
            "Laconic: using few words.",
        ])));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();

        assert_eq!(inserted.len(), 2);
        assert_eq!(store.count_items(&topic.id).unwrap(), 2);
        assert_eq!(inserted[0].size_class, SizeClass::Short);
    }

    #[tokio::test]
    async fn test_exact_duplicates_dropped() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");

        let existing = store
            .append_items(&[NewContentItem {
                topic_id: topic.id.clone(),
                content: "Honey never spoils.".to_string(),
                sources: Vec::new(),
                size_class: SizeClass::Short,
            }])
            .unwrap();

        // One duplicate of history (with whitespace), one in-batch
        // duplicate, one fresh item
        let llm = Arc::new(MockLlmClient::with_response(structured_response(&[
            "  Honey never spoils.  ",
            "Bananas are berries.",
            "Bananas are berries.",
        ])));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &existing, 20).await.unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].content, "Bananas are berries.");
        assert_eq!(store.count_items(&topic.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_batch_size_class_forced_uniform() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "detailed Rust tutorials");

        let long = "x".repeat(300);
        let llm = Arc::new(MockLlmClient::with_response(structured_response(&[
            "short one",
            &long,
        ])));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();

        assert_eq!(inserted.len(), 2);
        assert!(inserted
            .iter()
            .all(|item| item.size_class == SizeClass::Detailed));
    }

    #[tokio::test]
    async fn test_code_fence_classifies_detailed() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "full code snippets");

        let llm = Arc::new(MockLlmClient::with_response(structured_response(&[
            "```rust\nfn main() {}\n```",
        ])));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();
        assert_eq!(inserted[0].size_class, SizeClass::Detailed);
    }

    #[tokio::test]
    async fn test_generator_error_falls_back() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");
        let llm = Arc::new(MockLlmClient::always_failing());

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();

        assert_eq!(inserted.len(), 20);
        for item in &inserted {
            assert!(item.content.starts_with("Test Topic #"));
        }
        // All unique
        let unique: HashSet<&str> = inserted.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(unique.len(), 20);
    }

    #[tokio::test]
    async fn test_unparseable_response_falls_back() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");
        let llm = Arc::new(MockLlmClient::with_response(
            "I'm sorry, I can't produce a list right now.",
        ));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 5).await.unwrap();
        assert_eq!(inserted.len(), 5);
    }

    #[tokio::test]
    async fn test_numbered_list_legacy_parse() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");
        let llm = Arc::new(MockLlmClient::with_response(
            "1. First fact.\n2. Second fact.",
        ));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();

        let contents: Vec<&str> = inserted.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["First fact.", "Second fact."]);
    }

    #[tokio::test]
    async fn test_no_client_means_fallback_only() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");

        let pipeline = pipeline_with(Arc::clone(&store), None);
        let inserted = pipeline.generate(&topic, &[], 10).await.unwrap();
        assert_eq!(inserted.len(), 10);
    }

    #[tokio::test]
    async fn test_fallback_unique_against_existing() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");

        // Pre-seed most of the suffix space so collisions are guaranteed
        let seeded: Vec<NewContentItem> = (0..900)
            .map(|n| NewContentItem {
                topic_id: topic.id.clone(),
                content: format!("Test Topic #{}", n),
                sources: Vec::new(),
                size_class: SizeClass::Short,
            })
            .collect();
        let existing = store.append_items(&seeded).unwrap();

        let pipeline = pipeline_with(Arc::clone(&store), None);
        let inserted = pipeline.generate(&topic, &existing, 10).await.unwrap();

        let existing_set: HashSet<&str> = existing.iter().map(|i| i.content.as_str()).collect();
        for item in &inserted {
            assert!(!existing_set.contains(item.content.as_str()));
        }
        let unique: HashSet<&str> = inserted.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(unique.len(), inserted.len());
    }

    #[tokio::test]
    async fn test_batch_capped_at_requested_count() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");

        let contents: Vec<String> = (0..30).map(|i| format!("fact {}", i)).collect();
        let refs: Vec<&str> = contents.iter().map(|s| s.as_str()).collect();
        let llm = Arc::new(MockLlmClient::with_response(structured_response(&refs)));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();
        assert_eq!(inserted.len(), 20);
    }

    #[tokio::test]
    async fn test_sources_built_from_attribution() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = make_topic(store.as_ref(), "facts");

        let response = serde_json::json!([
            {"content": "Linked fact.", "source_title": "Wikipedia", "source_url": "https://en.wikipedia.org/wiki/Fact"},
            {"content": "Untitled link.", "source_title": null, "source_url": "https://www.nasa.gov/moon"},
            {"content": "Title only, no link.", "source_title": "Somewhere", "source_url": null}
        ])
        .to_string();
        let llm = Arc::new(MockLlmClient::with_response(response));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();

        assert_eq!(inserted[0].sources[0].label, "Wikipedia");
        // Label derived from the URL host when the title is missing
        assert_eq!(inserted[1].sources[0].label, "nasa.gov");
        assert!(inserted[2].sources.is_empty());
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.nasa.gov/moon/landing"), "nasa.gov");
        assert_eq!(domain_of("http://example.com"), "example.com");
        assert_eq!(domain_of("bare-host.org/path"), "bare-host.org");
    }

    #[test]
    fn test_build_sources_blank_url_dropped() {
        let item = RawGeneratedItem {
            content: "text".to_string(),
            source_title: Some("Title".to_string()),
            source_url: Some("   ".to_string()),
        };
        assert!(build_sources(&item).is_empty());
    }

    #[tokio::test]
    async fn test_sample_scenario_fresh_topic_twenty_items() {
        let store: Arc<dyn FeedStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let topic = store
            .create_topic("gre-vocabulary", "GRE vocabulary", "GRE vocabulary")
            .unwrap();

        let contents: Vec<String> = (0..20).map(|i| format!("Word {}: definition.", i)).collect();
        let refs: Vec<&str> = contents.iter().map(|s| s.as_str()).collect();
        let llm = Arc::new(MockLlmClient::with_response(structured_response(&refs)));

        let pipeline = pipeline_with(Arc::clone(&store), Some(llm));
        let inserted = pipeline.generate(&topic, &[], 20).await.unwrap();
        assert_eq!(inserted.len(), 20);

        let listed = store.list_items(&topic.id).unwrap();
        assert_eq!(listed.len(), 20);
        for (i, item) in listed.iter().enumerate() {
            assert_eq!(item.content, format!("Word {}: definition.", i));
        }
    }
}
