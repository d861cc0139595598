use hypersockets::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::candles::{DEFAULT_BUCKET_MINUTES, DEFAULT_MAX_CANDLES};
use crate::domain::recent_trades::DEFAULT_RECENT_TRADES;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Terminal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// REST base URL, overridable with API_BASE_URL
    pub base_url: String,
    /// Live trade stream URL, overridable with WS_URL
    pub ws_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_exponent: u32,
    pub connect_timeout_secs: u64,
    /// Snapshot refresh interval; 0 disables polling
    pub poll_interval_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            max_exponent: ExponentialBackoff::DEFAULT_MAX_EXPONENT,
            connect_timeout_secs: 10,
            poll_interval_secs: 15,
        }
    }
}

impl StreamConfig {
    pub fn reconnect_strategy(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            None,
        )
        .with_max_exponent(self.max_exponent)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub bucket_minutes: i64,
    pub max_candles: usize,
    /// Hours of history requested on load
    pub history_hours: u32,
    /// Capacity of the recent trades list
    pub recent_trades: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: DEFAULT_BUCKET_MINUTES,
            max_candles: DEFAULT_MAX_CANDLES,
            history_hours: 24,
            recent_trades: DEFAULT_RECENT_TRADES,
        }
    }
}

impl ChartConfig {
    pub fn bucket_width(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.bucket_minutes)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl TerminalConfig {
    /// Load configuration from YAML file, then apply `.env` / environment overrides
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml(&yaml_content)?;

        config.apply_overrides(
            std::env::var("API_BASE_URL").ok(),
            std::env::var("WS_URL").ok(),
        );

        config.validate()?;
        Ok(config)
    }

    /// Parse without environment overrides or validation
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>, ws_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            info!("Overriding API base URL from environment variable");
            self.api.base_url = url;
        }
        if let Some(url) = ws_url.filter(|u| !u.trim().is_empty()) {
            info!("Overriding WebSocket URL from environment variable");
            self.api.ws_url = url;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(
                "api.base_url must start with http:// or https://".to_string(),
            ));
        }

        if !(self.api.ws_url.starts_with("ws://") || self.api.ws_url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(
                "api.ws_url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.api.request_timeout_secs == 0 || self.stream.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if self.stream.initial_delay_ms == 0 || self.stream.max_delay_ms < self.stream.initial_delay_ms {
            return Err(ConfigError::ValidationError(
                "stream delays must satisfy 0 < initial_delay_ms <= max_delay_ms".to_string(),
            ));
        }

        if self.chart.bucket_minutes <= 0 || self.chart.max_candles == 0 || self.chart.history_hours == 0 {
            return Err(ConfigError::ValidationError(
                "chart.bucket_minutes, chart.max_candles and chart.history_hours must be greater than 0"
                    .to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  API: {}", self.api.base_url);
        info!("  Stream: {}", self.api.ws_url);
        info!(
            "  Backoff: {}ms doubling to {}ms (exponent cap {})",
            self.stream.initial_delay_ms, self.stream.max_delay_ms, self.stream.max_exponent
        );
        info!("  Poll interval: {}s", self.stream.poll_interval_secs);
        info!(
            "  Candles: {}m x {} ({}h history)",
            self.chart.bucket_minutes, self.chart.max_candles, self.chart.history_hours
        );
        info!("  Log level: {}", self.log_level);
    }
}
