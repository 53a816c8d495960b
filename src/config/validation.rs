use crate::config::types::{ApiConfig, Config, CrawlerConfig, SnapshotConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Longest matchlist window the provider accepts
pub const MAX_WINDOW_DAYS: u32 = 7;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_snapshot_config(&config.snapshot)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api key cannot be empty".to_string(),
        ));
    }

    if let Some(base) = &config.base_url {
        // The template placeholder is not a valid host character
        let probe = base.replace("{region}", "na1");
        let url = Url::parse(&probe)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url '{}' must use http or https",
                base
            )));
        }
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_matchlist_pages == 0 {
        return Err(ConfigError::Validation(
            "max-matchlist-pages must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seed_player.trim().is_empty() {
        return Err(ConfigError::Validation(
            "seed-player cannot be empty".to_string(),
        ));
    }

    if config.retry_backoff_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "retry-backoff-ms must be <= 60000ms, got {}ms",
            config.retry_backoff_ms
        )));
    }

    if config.max_failures < 1 {
        return Err(ConfigError::Validation(
            "max-failures must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates snapshot configuration
fn validate_snapshot_config(config: &SnapshotConfig) -> Result<(), ConfigError> {
    if config.regions.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot regions cannot be empty".to_string(),
        ));
    }

    if config.tiers.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot tiers cannot be empty".to_string(),
        ));
    }

    if config.window_days < 1 || config.window_days > MAX_WINDOW_DAYS {
        return Err(ConfigError::Validation(format!(
            "window-days must be between 1 and {}, got {}",
            MAX_WINDOW_DAYS, config.window_days
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
