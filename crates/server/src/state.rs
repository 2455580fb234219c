use std::sync::Arc;

use scrollforge_core::{Config, FeedPaginator, SanitizedConfig, SuggestionService};

/// Shared application state
pub struct AppState {
    config: Config,
    paginator: Arc<FeedPaginator>,
    suggestions: Arc<SuggestionService>,
}

impl AppState {
    pub fn new(
        config: Config,
        paginator: Arc<FeedPaginator>,
        suggestions: Arc<SuggestionService>,
    ) -> Self {
        Self {
            config,
            paginator,
            suggestions,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn paginator(&self) -> &FeedPaginator {
        &self.paginator
    }

    pub fn suggestions(&self) -> &SuggestionService {
        &self.suggestions
    }
}
