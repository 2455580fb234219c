use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrollforge_core::{
    load_config, validate_config, AnthropicClient, Config, FeedPaginator, FeedStore,
    GenerationPipeline, GeneratorConfig, GeneratorProvider, JsonStore, LlmClient,
    LocalCoordinator, OllamaClient, PipelineConfig, SqliteStore, StorageBackend,
    SuggestionService,
};

use scrollforge_server::api::create_router;
use scrollforge_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SCROLLFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration (defaults are a complete working setup)
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        warn!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");
    info!("Database backend: {:?}", config.database.backend);
    info!("Database path: {:?}", config.database.path);

    // Create the feed store
    let store: Arc<dyn FeedStore> = match config.database.backend {
        StorageBackend::Sqlite => Arc::new(
            SqliteStore::new(&config.database.path).context("Failed to open sqlite store")?,
        ),
        StorageBackend::Json => Arc::new(
            JsonStore::new(&config.database.path).context("Failed to open json store")?,
        ),
    };
    info!("Feed store initialized");

    // Create the generator client if configured
    let llm: Option<Arc<dyn LlmClient>> = match &config.generator {
        Some(generator_config) => {
            let client = create_llm_client(generator_config);
            info!(
                "Generator initialized: {} ({})",
                client.provider(),
                client.model()
            );
            Some(client)
        }
        None => {
            warn!("No generator configured; feeds will contain placeholder items only");
            None
        }
    };

    // Create pipeline, coordinator and paginator
    let pipeline = Arc::new(GenerationPipeline::new(
        Arc::clone(&store),
        llm.clone(),
        PipelineConfig::from_config(&config.feed, config.generator.as_ref()),
    ));

    let coordinator = Arc::new(LocalCoordinator::new(
        config.feed.rate_limit_per_minute,
        Duration::from_secs(config.feed.generation_lock_timeout_secs),
    ));

    let paginator = Arc::new(FeedPaginator::new(
        Arc::clone(&store),
        pipeline,
        coordinator,
        config.feed.clone(),
    ));

    let suggestions = Arc::new(SuggestionService::new(llm, config.suggestions.clone()));

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), paginator, suggestions));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Build the configured LLM client.
fn create_llm_client(config: &GeneratorConfig) -> Arc<dyn LlmClient> {
    let timeout = Duration::from_secs(config.timeout_secs as u64);
    match config.provider {
        GeneratorProvider::Anthropic => {
            let mut client = AnthropicClient::new(
                config.api_key.clone().unwrap_or_default(),
                config.model.clone(),
                timeout,
            );
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base.clone());
            }
            Arc::new(client)
        }
        GeneratorProvider::Ollama => {
            let mut client = OllamaClient::new(config.model.clone(), timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base.clone());
            }
            Arc::new(client)
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
