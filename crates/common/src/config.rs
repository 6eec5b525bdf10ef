//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Completion provider settings
//! live next to the provider in `medchat-llm`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default SQLite location, created on first use
pub const DEFAULT_DATABASE_URL: &str = "sqlite://chat_history.db?mode=rwc";

/// Default upload limit (200 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,medchat_conversations=debug,medchat_llm=debug";

/// Sessions untouched for this long are discarded (30 minutes)
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat log location
    pub database_url: String,

    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,

    /// Idle time after which a session counts as disconnected
    pub session_idle_secs: u64,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_BYTES must be a byte count"))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let session_idle_secs = match env::var("SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .ok_or_else(|| anyhow::anyhow!("SESSION_IDLE_SECS must be a positive number"))?,
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_upload_bytes,
            session_idle_secs,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}
