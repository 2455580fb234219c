use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Optional; when absent every generation batch takes the fallback path.
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Sqlite,
    /// Single JSON document rewritten wholesale on every mutation.
    /// Local/dev fallback only.
    Json,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_db_path() -> PathBuf {
    PathBuf::from("scrollforge.db")
}

/// Generator (LLM) provider selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorProvider {
    Anthropic,
    Ollama,
}

/// Generator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    pub provider: GeneratorProvider,
    /// Model name (e.g. "claude-3-5-haiku-latest", "llama3")
    pub model: String,
    /// API key (required for anthropic)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override the provider's API base URL
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u32,
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.8
}

fn default_generator_timeout() -> u32 {
    60
}

/// Feed pipeline and pagination configuration.
///
/// Every threshold the paginator and pipeline use lives here; nothing is
/// hard-coded in the flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Items returned per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Items requested per generation batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Generate on the initial page while fewer than this many items exist.
    #[serde(default = "default_min_initial_items")]
    pub min_initial_items: u32,
    /// Most recent items included in the prompt as dedup context.
    #[serde(default = "default_history_window")]
    pub history_window: u32,
    /// Page calls allowed per topic per 60s window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Generation lock staleness cutoff.
    #[serde(default = "default_lock_timeout")]
    pub generation_lock_timeout_secs: u64,
    /// How long a caller waits out a concurrent generation before re-reading.
    #[serde(default = "default_busy_wait")]
    pub busy_wait_secs: u64,
    /// Content longer than this is classified as detailed.
    #[serde(default = "default_detailed_threshold")]
    pub detailed_threshold_chars: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            batch_size: default_batch_size(),
            min_initial_items: default_min_initial_items(),
            history_window: default_history_window(),
            rate_limit_per_minute: default_rate_limit(),
            generation_lock_timeout_secs: default_lock_timeout(),
            busy_wait_secs: default_busy_wait(),
            detailed_threshold_chars: default_detailed_threshold(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_batch_size() -> u32 {
    20
}

fn default_min_initial_items() -> u32 {
    20
}

fn default_history_window() -> u32 {
    25
}

fn default_rate_limit() -> u32 {
    10
}

fn default_lock_timeout() -> u64 {
    60
}

fn default_busy_wait() -> u64 {
    4
}

fn default_detailed_threshold() -> u32 {
    200
}

/// Topic suggestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuggestionsConfig {
    /// Suggestions served for empty/short queries and on generator failure.
    #[serde(default = "default_static_suggestions")]
    pub static_suggestions: Vec<String>,
    /// Maximum suggestions returned per request.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: u32,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            static_suggestions: default_static_suggestions(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

fn default_static_suggestions() -> Vec<String> {
    [
        "World wonders",
        "SAT vocabulary",
        "Coding challenges",
        "Historical facts",
        "Science trivia",
        "Movie quotes",
        "Philosophy quotes",
        "Math problems",
        "Language learning",
        "Fun facts",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_suggestions() -> u32 {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<SanitizedGeneratorConfig>,
    pub feed: FeedConfig,
}

/// Sanitized generator config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub provider: String,
    pub model: String,
    pub api_key_configured: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            generator: config.generator.as_ref().map(|g| SanitizedGeneratorConfig {
                provider: match g.provider {
                    GeneratorProvider::Anthropic => "anthropic".to_string(),
                    GeneratorProvider::Ollama => "ollama".to_string(),
                },
                model: g.model.clone(),
                api_key_configured: g.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                max_tokens: g.max_tokens,
                temperature: g.temperature,
                timeout_secs: g.timeout_secs,
            }),
            feed: config.feed.clone(),
        }
    }
}
