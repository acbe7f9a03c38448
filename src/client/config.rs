use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, DEFAULT_DATABASE_FILE};
use std::path::{Path, PathBuf};

/// Environment variable overriding the server URL
const API_URL_ENV: &str = "POS_API_URL";
/// Environment variable overriding the local database path
const DATABASE_PATH_ENV: &str = "POS_DATABASE_PATH";

/// Client configuration wrapper.
///
/// Wraps the validated [`AppConfig`] with environment overrides and the
/// session's bearer token.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let app = apply_env(AppConfig::default());
        Self { app, token: None }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, token: None })
    }

    /// Load a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let app = apply_env(AppConfig::from_file(path)?);
        app.validate()?;
        Ok(Self { app, token: None })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url().trim_end_matches('/'), path)
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    /// Resolved local database path
    pub fn database_path(&self) -> PathBuf {
        self.app.database_path.clone().unwrap_or_else(default_database_path)
    }
}

/// Platform data directory, falling back to the temp directory
fn default_database_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    path.push("pos-offline");
    path.push(DEFAULT_DATABASE_FILE);
    path
}

fn apply_env(mut app: AppConfig) -> AppConfig {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        app.server_url = url;
    }
    if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
        app.database_path = Some(PathBuf::from(path));
    }
    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_new() {
        std::env::remove_var(API_URL_ENV);
        let config = Config::new();
        assert_eq!(config.server_url(), "http://127.0.0.1:8000");
        assert!(config.get_token().is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var(API_URL_ENV, "http://pos.local:9000");
        let config = Config::new();
        std::env::remove_var(API_URL_ENV);
        assert_eq!(config.server_url(), "http://pos.local:9000");
    }

    #[test]
    fn test_set_and_clear_token() {
        let mut config = Config::with_builder(AppConfig::builder()).unwrap();
        config.set_token(Some("test_token".to_string()));
        assert_eq!(config.get_token(), Some(&"test_token".to_string()));
        config.clear_token();
        assert!(config.get_token().is_none());
    }

    #[test]
    fn test_api_url() {
        let config =
            Config::with_builder(AppConfig::builder().server_url("http://127.0.0.1:8000/")).unwrap();
        assert_eq!(config.api_url("/ventas/"), "http://127.0.0.1:8000/ventas/");
    }

    #[test]
    fn test_database_path_default_file_name() {
        let config = Config::with_builder(AppConfig::builder()).unwrap();
        assert!(config.database_path().ends_with(DEFAULT_DATABASE_FILE));
    }
}
