use crate::domain::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub dexscreener_api_url: String,
    /// Concurrent feed fetches during a bulk refresh sweep.
    pub refresh_concurrency: usize,
    /// Deadline for a single upstream feed call, in milliseconds.
    pub feed_timeout_ms: u64,
    /// A price multiplier above threshold * market-cap ratio is corrupt.
    pub corruption_threshold: Decimal,
    pub decay_mode: DecayMode,
    /// Background refresh-all cadence in seconds; 0 disables the poller.
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayMode {
    None,
    Linear,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let dexscreener_api_url = env_map
            .get("DEXSCREENER_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://api.dexscreener.com".to_string());

        let refresh_concurrency = env_map
            .get("REFRESH_CONCURRENCY")
            .map(|s| s.as_str())
            .unwrap_or("4")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "REFRESH_CONCURRENCY".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let feed_timeout_ms = env_map
            .get("FEED_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "FEED_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let corruption_threshold = env_map
            .get("CORRUPTION_THRESHOLD")
            .map(|s| s.as_str())
            .unwrap_or("5")
            .parse::<Decimal>()
            .ok()
            .filter(|d| d.is_positive())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "CORRUPTION_THRESHOLD".to_string(),
                    "must be a positive decimal".to_string(),
                )
            })?;

        let decay_mode = match env_map
            .get("DECAY_MODE")
            .map(|s| s.as_str())
            .unwrap_or("linear")
        {
            "none" => DecayMode::None,
            "linear" => DecayMode::Linear,
            other => {
                return Err(ConfigError::InvalidValue(
                    "DECAY_MODE".to_string(),
                    format!("must be none or linear, got {}", other),
                ))
            }
        };

        let poll_interval_secs = env_map
            .get("POLL_INTERVAL_SECS")
            .map(|s| s.as_str())
            .unwrap_or("120")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "POLL_INTERVAL_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            dexscreener_api_url,
            refresh_concurrency,
            feed_timeout_ms,
            corruption_threshold,
            decay_mode,
            poll_interval_secs,
        })
    }
}
