use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::types::app_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(&contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

/// Like [`load_config`], but a missing file falls back to built-in defaults.
/// Both binaries run out of the box this way; an unreadable or invalid file
/// is still a hard error.
pub fn load_or_default(path: &str) -> Result<AppConfig, ConfigError> {
    if !Path::new(path).exists() {
        info!("No config file at {}, using defaults", path);
        return Ok(AppConfig::default());
    }
    load_config(path)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.bind.is_empty() {
        return Err(ConfigError::InvalidConfig("bind cannot be empty".into()));
    }

    if config.server.port == 0 {
        return Err(ConfigError::InvalidConfig(
            "port must be greater than 0".into(),
        ));
    }

    if config.server.channel_capacity == 0 {
        return Err(ConfigError::InvalidConfig(
            "channel_capacity must be greater than 0".into(),
        ));
    }

    if config.server.broadcast_interval_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "broadcast_interval_secs must be greater than 0".into(),
        ));
    }

    if !config.stream.url.starts_with("http://") && !config.stream.url.starts_with("https://") {
        return Err(ConfigError::InvalidConfig(
            "stream.url must be an http:// or https:// endpoint".into(),
        ));
    }

    if config.stream.retry_ms == 0 {
        return Err(ConfigError::InvalidConfig(
            "retry_ms must be greater than 0".into(),
        ));
    }

    Ok(())
}
