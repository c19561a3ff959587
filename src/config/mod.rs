//! Configuration management for the consensus engine
//!
//! Loads defaults, optional config files and environment variables via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub feed: FeedConfig,
    pub oracles: OraclesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Per-oracle observe/reason timeout in milliseconds
    pub call_timeout_ms: u64,
    /// Number of consensus results kept in memory
    pub history_capacity: usize,
    /// Daemon consensus cadence in seconds
    pub run_interval_secs: u64,
}

impl EngineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 5000,
            history_capacity: 100,
            run_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Market data API root
    pub base_url: String,
    /// Asset ids or tickers to observe
    pub assets: Vec<String>,
    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OraclesConfig {
    pub price_enabled: bool,
    pub volume_enabled: bool,
    pub trend_enabled: bool,
    pub momentum_enabled: bool,
    pub adversarial_enabled: bool,
    pub consistency_enabled: bool,
    /// Asset whose price the momentum oracle tracks
    pub momentum_asset: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (META_ORACLE__ENGINE__CALL_TIMEOUT_MS etc.)
            .add_source(
                Environment::with_prefix("META_ORACLE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("feed.assets")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self> {
        Self::builder()?
            .build()
            .context("Failed to build default configuration")?
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let engine = EngineConfig::default();
        let builder = Config::builder()
            // Engine defaults
            .set_default("engine.call_timeout_ms", engine.call_timeout_ms)?
            .set_default("engine.history_capacity", engine.history_capacity as u64)?
            .set_default("engine.run_interval_secs", engine.run_interval_secs)?
            // Feed defaults
            .set_default("feed.base_url", "https://api.coingecko.com/api/v3")?
            .set_default("feed.assets", vec!["bitcoin", "ethereum"])?
            .set_default("feed.request_timeout_ms", 10_000)?
            // Oracle defaults
            .set_default("oracles.price_enabled", true)?
            .set_default("oracles.volume_enabled", true)?
            .set_default("oracles.trend_enabled", true)?
            .set_default("oracles.momentum_enabled", true)?
            .set_default("oracles.adversarial_enabled", true)?
            .set_default("oracles.consistency_enabled", true)?
            .set_default("oracles.momentum_asset", "bitcoin")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "timeout_ms={} history={} interval_s={} assets={:?} feed={}",
            self.engine.call_timeout_ms,
            self.engine.history_capacity,
            self.engine.run_interval_secs,
            self.feed.assets,
            self.feed.base_url
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
