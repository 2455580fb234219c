use super::{types::Config, ConfigError, GeneratorProvider};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Feed thresholds are usable (non-zero page/batch sizes, sane waits)
/// - Anthropic generator has an API key
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Feed validation
    let feed = &config.feed;
    if feed.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "feed.page_size cannot be 0".to_string(),
        ));
    }
    if feed.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "feed.batch_size cannot be 0".to_string(),
        ));
    }
    if feed.rate_limit_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "feed.rate_limit_per_minute cannot be 0".to_string(),
        ));
    }
    if feed.generation_lock_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "feed.generation_lock_timeout_secs cannot be 0".to_string(),
        ));
    }
    if feed.busy_wait_secs >= feed.generation_lock_timeout_secs {
        return Err(ConfigError::ValidationError(
            "feed.busy_wait_secs must be shorter than feed.generation_lock_timeout_secs"
                .to_string(),
        ));
    }

    // Generator validation
    if let Some(generator) = &config.generator {
        if generator.model.is_empty() {
            return Err(ConfigError::ValidationError(
                "generator.model cannot be empty".to_string(),
            ));
        }
        if generator.provider == GeneratorProvider::Anthropic
            && generator.api_key.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConfigError::ValidationError(
                "generator.api_key is required for the anthropic provider".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&generator.temperature) {
            return Err(ConfigError::ValidationError(
                "generator.temperature must be between 0.0 and 1.0".to_string(),
            ));
        }
    }

    Ok(())
}
