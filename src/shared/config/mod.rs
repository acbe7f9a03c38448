//! Application configuration module
//!
//! Provides configuration types for the application: where the store server
//! lives, where the local database is kept, and the timings of the probe,
//! reconnect debounce and pending-count refresh.
//!
//! Configuration can be built in code through [`AppConfigBuilder`] or loaded
//! from a TOML file:
//!
//! ```toml
//! server_url = "http://192.168.0.10:8000"
//! probe_interval_secs = 30
//! probe_timeout_secs = 5
//! reconnect_settle_ms = 2000
//! catalog_page_size = 100
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default store server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
/// Default health-check path probed by the connectivity monitor
pub const DEFAULT_HEALTH_PATH: &str = "/api/health";
/// Default database file name inside the data directory
pub const DEFAULT_DATABASE_FILE: &str = "pos_offline.db";

const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);
const DEFAULT_PENDING_REFRESH: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_RETENTION_DAYS: u32 = 7;
/// The server caps `limit` on catalog pages at this value
const MAX_PAGE_SIZE: u32 = 100;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Store server base URL
    pub server_url: String,
    /// Path of the lightweight health endpoint
    pub health_path: String,
    /// Local database file; `None` uses the platform data directory
    pub database_path: Option<PathBuf>,
    /// Interval between active connectivity probes
    pub probe_interval: Duration,
    /// Hard timeout of a single probe
    pub probe_timeout: Duration,
    /// Delay between a reconnect and the sync it triggers
    pub reconnect_settle_delay: Duration,
    /// Interval of the pending-sales count refresh
    pub pending_refresh_interval: Duration,
    /// Items requested per catalog page
    pub catalog_page_size: u32,
    /// Days synchronized sales are retained before purge
    pub sync_retention_days: u32,
    /// Timeout applied by the HTTP client to each request
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            database_path: None,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            reconnect_settle_delay: DEFAULT_SETTLE_DELAY,
            pending_refresh_interval: DEFAULT_PENDING_REFRESH,
            catalog_page_size: DEFAULT_PAGE_SIZE,
            sync_retention_days: DEFAULT_RETENTION_DAYS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.server_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.server_url, e)))?;

        if !self.health_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "health_path",
                message: "must start with '/'".to_string(),
            });
        }
        if self.catalog_page_size == 0 || self.catalog_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "catalog_page_size",
                message: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        for (field, value) in [
            ("probe_interval", self.probe_interval),
            ("probe_timeout", self.probe_timeout),
            ("pending_refresh_interval", self.pending_refresh_interval),
            ("request_timeout", self.request_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.probe_timeout >= self.probe_interval {
            return Err(ConfigError::InvalidValue {
                field: "probe_timeout",
                message: "must be shorter than probe_interval".to_string(),
            });
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(source)?;
        file.into_builder().build()
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn health_path(mut self, path: impl Into<String>) -> Self {
        self.config.health_path = path.into();
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = Some(path.into());
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn reconnect_settle_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_settle_delay = delay;
        self
    }

    pub fn pending_refresh_interval(mut self, interval: Duration) -> Self {
        self.config.pending_refresh_interval = interval;
        self
    }

    pub fn catalog_page_size(mut self, size: u32) -> Self {
        self.config.catalog_page_size = size;
        self
    }

    pub fn sync_retention_days(mut self, days: u32) -> Self {
        self.config.sync_retention_days = days;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// On-disk representation; every key is optional and falls back to the default
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    health_path: Option<String>,
    database_path: Option<PathBuf>,
    probe_interval_secs: Option<u64>,
    probe_timeout_secs: Option<u64>,
    reconnect_settle_ms: Option<u64>,
    pending_refresh_secs: Option<u64>,
    catalog_page_size: Option<u32>,
    sync_retention_days: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl FileConfig {
    fn into_builder(self) -> AppConfigBuilder {
        let mut builder = AppConfig::builder();
        if let Some(url) = self.server_url {
            builder = builder.server_url(url);
        }
        if let Some(path) = self.health_path {
            builder = builder.health_path(path);
        }
        if let Some(path) = self.database_path {
            builder = builder.database_path(path);
        }
        if let Some(secs) = self.probe_interval_secs {
            builder = builder.probe_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = self.probe_timeout_secs {
            builder = builder.probe_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.reconnect_settle_ms {
            builder = builder.reconnect_settle_delay(Duration::from_millis(ms));
        }
        if let Some(secs) = self.pending_refresh_secs {
            builder = builder.pending_refresh_interval(Duration::from_secs(secs));
        }
        if let Some(size) = self.catalog_page_size {
            builder = builder.catalog_page_size(size);
        }
        if let Some(days) = self.sync_retention_days {
            builder = builder.sync_retention_days(days);
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        builder
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}
