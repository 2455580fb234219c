//! The feed paginator: read a page, generating more content first when
//! the window would run short.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::coordination::{CoordinationError, Coordinator, LockOutcome};
use crate::feed::slug::slugify;
use crate::feed::FeedError;
use crate::metrics::{GENERATION_WAITS, PAGE_REQUESTS};
use crate::pipeline::GenerationPipeline;
use crate::store::{ContentItem, FeedStore, StoreError, Topic, TopicSummary};

/// Serves pages of a topic's feed, triggering generation on shortfall.
///
/// At most one generation per topic is in flight at a time; concurrent
/// callers observing the same shortfall wait briefly and read whatever
/// the winner produced instead of generating twice.
pub struct FeedPaginator {
    store: Arc<dyn FeedStore>,
    pipeline: Arc<GenerationPipeline>,
    coordinator: Arc<dyn Coordinator>,
    config: FeedConfig,
}

impl FeedPaginator {
    pub fn new(
        store: Arc<dyn FeedStore>,
        pipeline: Arc<GenerationPipeline>,
        coordinator: Arc<dyn Coordinator>,
        config: FeedConfig,
    ) -> Self {
        Self {
            store,
            pipeline,
            coordinator,
            config,
        }
    }

    /// Create a topic with a collision-free slug derived from the title.
    pub async fn create_topic(
        &self,
        title: &str,
        prompt_template: &str,
    ) -> Result<Topic, FeedError> {
        let title = title.trim();
        let prompt_template = prompt_template.trim();
        if title.is_empty() || prompt_template.is_empty() {
            return Err(FeedError::InvalidInput(
                "title and prompt_template are required".to_string(),
            ));
        }

        let base = slugify(title);
        let mut slug = base.clone();
        let mut counter = 1;
        while self.store.is_slug_taken(&slug)? {
            slug = format!("{}-{}", base, counter);
            counter += 1;
        }

        let topic = self.store.create_topic(&slug, title, prompt_template)?;
        info!(slug = %topic.slug, "topic created");
        Ok(topic)
    }

    /// Most recently created topics with preview content.
    pub async fn trending(&self, limit: u32) -> Result<Vec<TopicSummary>, FeedError> {
        Ok(self.store.recent_topics(limit)?)
    }

    /// Return the page `[offset, offset + page_size)` of the topic's
    /// chronological feed, generating a batch first when the window
    /// would otherwise run short.
    pub async fn page(
        &self,
        slug: &str,
        offset: usize,
        load_more: bool,
    ) -> Result<Vec<ContentItem>, FeedError> {
        let result = self.page_inner(slug, offset, load_more).await;
        let label = match &result {
            Ok(_) => "served",
            Err(FeedError::TopicNotFound(_)) => "not_found",
            Err(FeedError::RateLimited { .. }) => "rate_limited",
            Err(_) => "error",
        };
        PAGE_REQUESTS.with_label_values(&[label]).inc();
        result
    }

    async fn page_inner(
        &self,
        slug: &str,
        offset: usize,
        load_more: bool,
    ) -> Result<Vec<ContentItem>, FeedError> {
        let topic = self
            .store
            .topic_by_slug(slug)?
            .ok_or_else(|| FeedError::TopicNotFound(slug.to_string()))?;

        match self.coordinator.check_rate(&topic.id).await {
            Ok(()) => {}
            Err(CoordinationError::RateLimited { retry_after_secs }) => {
                warn!(slug = %topic.slug, retry_after_secs, "page request rate limited");
                return Err(FeedError::RateLimited { retry_after_secs });
            }
        }

        let count = self.store.count_items(&topic.id)? as usize;
        if let Some(target) = self.generation_target(count, offset, load_more) {
            self.generate_once(&topic, target).await?;
        }

        let items = self.store.list_items(&topic.id)?;
        let page_size = self.config.page_size as usize;
        Ok(items
            .into_iter()
            .skip(offset)
            .take(page_size)
            .collect())
    }

    /// Shortfall policy: top up the initial page below the low-water
    /// mark, and keep a two-page forward buffer on load-more. Returns
    /// the item count the feed should reach, or `None` when no
    /// generation is needed.
    fn generation_target(&self, count: usize, offset: usize, load_more: bool) -> Option<usize> {
        let page_size = self.config.page_size as usize;
        if load_more {
            let target = offset + 2 * page_size;
            (count < target).then_some(target)
        } else {
            let target = self.config.min_initial_items as usize;
            (offset == 0 && count < target).then_some(target)
        }
    }

    /// Run one single-flight generation round for the topic.
    ///
    /// A caller that loses the lock race waits out the configured delay
    /// and reads the winner's output; a caller that wins re-checks the
    /// shortfall under the lock before generating.
    async fn generate_once(&self, topic: &Topic, target: usize) -> Result<(), FeedError> {
        match self.coordinator.begin_generation(&topic.id).await {
            LockOutcome::Busy => {
                debug!(slug = %topic.slug, "generation already in flight, waiting");
                GENERATION_WAITS.with_label_values(&[]).inc();
                sleep(Duration::from_secs(self.config.busy_wait_secs)).await;
                Ok(())
            }
            LockOutcome::Acquired => {
                let result = self.generate_locked(topic, target).await;
                // Release before propagating so a storage failure cannot
                // wedge the topic until the lock times out.
                self.coordinator.end_generation(&topic.id).await;
                result.map_err(FeedError::from)
            }
        }
    }

    async fn generate_locked(&self, topic: &Topic, target: usize) -> Result<(), StoreError> {
        // Another request may have finished a round between our count and
        // our lock; re-read before spending a generator call.
        let existing = self.store.list_items(&topic.id)?;
        if existing.len() >= target {
            debug!(slug = %topic.slug, "shortfall already covered, skipping generation");
            return Ok(());
        }

        self.pipeline
            .generate(topic, &existing, self.config.batch_size as usize)
            .await?;
        Ok(())
    }
}
