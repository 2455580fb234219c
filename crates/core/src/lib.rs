pub mod config;
pub mod coordination;
pub mod feed;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod suggestions;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    FeedConfig, GeneratorConfig, GeneratorProvider, SanitizedConfig, ServerConfig, StorageBackend,
    SuggestionsConfig,
};
pub use coordination::{CoordinationError, Coordinator, LocalCoordinator, LockOutcome};
pub use feed::{slugify, FeedError, FeedPaginator};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage,
    OllamaClient,
};
pub use pipeline::{GenerationPipeline, PipelineConfig, RawGeneratedItem};
pub use store::{
    ContentItem, FeedStore, JsonStore, NewContentItem, SizeClass, SourceRef, SqliteStore,
    StoreError, Topic, TopicSummary,
};
pub use suggestions::SuggestionService;
