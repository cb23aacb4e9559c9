//! Configuration and settings management.
//!
//! Loads settings from configuration files and environment variables. The
//! two credentials are required; everything else has a sensible default.

use crate::book::SessionPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// API key for the remote pricing service.
    pub pricing_api_key: String,

    /// Token for the chat platform gateway.
    pub chat_token: String,

    /// Directory holding the dataset snapshot files.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    /// Maximum snapshot age before a refresh is attempted.
    #[serde(default = "default_snapshot_ttl_hours")]
    pub snapshot_ttl_hours: u64,

    /// Catalog entries per page in the currencies book.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Seconds of inactivity before a navigation session is evicted.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Maximum number of concurrently tracked navigation sessions per book.
    #[serde(default = "default_session_max")]
    pub session_max: u64,

    /// The bot's own user id; its events are ignored.
    #[serde(default)]
    pub bot_user_id: u64,
}

fn default_snapshot_dir() -> String {
    "data".to_string()
}

const fn default_snapshot_ttl_hours() -> u64 {
    24
}

const fn default_page_size() -> usize {
    10
}

const fn default_session_idle_secs() -> u64 {
    30 * 60
}

const fn default_session_max() -> u64 {
    10_000
}

impl Settings {
    /// Create new settings by loading from configuration files and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Base configuration file
            .add_source(File::with_name("config/default").required(false))
            // Environment-specific overrides
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment variables win; empty values count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Snapshot TTL as a duration.
    #[must_use]
    pub const fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_hours * 60 * 60)
    }

    /// Eviction bounds for book navigation sessions.
    #[must_use]
    pub const fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            idle: Duration::from_secs(self.session_idle_secs),
            capacity: self.session_max,
        }
    }
}
