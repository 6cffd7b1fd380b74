//! Environment-derived configuration, read once at startup.

use std::net::IpAddr;
use std::path::PathBuf;

/// Server configuration.
///
/// Provider selections are opaque strings consumed by engine construction;
/// the gateway itself never interprets them.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub store_path: PathBuf,
    pub model_provider: String,
    pub search_provider: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env_parsed("HOST", IpAddr::from([127, 0, 0, 1])),
            port: env_parsed("PORT", 8000),
            log_level: env_or("LOG_LEVEL", "info"),
            store_path: PathBuf::from(env_or("STORE_PATH", "data/memories.redb")),
            model_provider: env_or("MODEL_PROVIDER", "openai"),
            search_provider: env_or("SEARCH_PROVIDER", "tavily"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
