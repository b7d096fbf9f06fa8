use crate::connection::ReconnectPolicy;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_url: String,
    pub reconnect: ReconnectPolicy,
    pub countdown_secs: u32,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let server_url =
            std::env::var("SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:8000/ws".to_string());
        if !(server_url.starts_with("ws://") || server_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidValue(
                "SERVER_URL".to_string(),
                format!("'{}' is not a ws:// or wss:// URL", server_url),
            ));
        }

        let max_attempts = parse_var("RECONNECT_MAX_ATTEMPTS", 5)?;
        let delay_secs = parse_var("RECONNECT_DELAY_SECS", 3)?;
        let countdown_secs = parse_var("COUNTDOWN_SECS", 10)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            server_url,
            reconnect: ReconnectPolicy {
                max_attempts,
                delay: Duration::from_secs(delay_secs.into()),
            },
            countdown_secs,
            log_level,
        })
    }
}

fn parse_var(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
