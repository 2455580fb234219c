//! Types for the generation pipeline.

use serde::{Deserialize, Serialize};

use crate::config::{FeedConfig, GeneratorConfig};

/// One item as returned by the generator, before cleaning and
/// classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGeneratedItem {
    pub content: String,
    #[serde(default)]
    pub source_title: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RawGeneratedItem {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_title: None,
            source_url: None,
        }
    }
}

/// Settings the pipeline needs per generation call.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Most recent items included in the prompt as dedup context.
    pub history_window: usize,
    /// Content longer than this is classified as detailed.
    pub detailed_threshold_chars: usize,
    /// Token budget for the completion request.
    pub max_tokens: u32,
    /// Sampling temperature for the completion request.
    pub temperature: f32,
    /// Retries per fallback item before giving up on uniqueness.
    pub fallback_suffix_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_window: 25,
            detailed_threshold_chars: 200,
            max_tokens: 2048,
            temperature: 0.8,
            fallback_suffix_attempts: 20,
        }
    }
}

impl PipelineConfig {
    /// Derive pipeline settings from the feed and (optional) generator
    /// config sections.
    pub fn from_config(feed: &FeedConfig, generator: Option<&GeneratorConfig>) -> Self {
        let defaults = Self::default();
        Self {
            history_window: feed.history_window as usize,
            detailed_threshold_chars: feed.detailed_threshold_chars as usize,
            max_tokens: generator.map(|g| g.max_tokens).unwrap_or(defaults.max_tokens),
            temperature: generator
                .map(|g| g.temperature)
                .unwrap_or(defaults.temperature),
            fallback_suffix_attempts: defaults.fallback_suffix_attempts,
        }
    }
}
