//! Server configuration.

use polystat_core::error::AnalyticsError;
use polystat_core::registry::AnalyticsType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_ENV: &str = "POLYSTAT_CONFIG";
/// Overrides `server.host`.
pub const HOST_ENV: &str = "POLYSTAT_HOST";
/// Overrides `server.port`.
pub const PORT_ENV: &str = "POLYSTAT_PORT";

/// Server-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Log level, used unless `RUST_LOG` is set.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Demo data seeded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Whether to seed at all.
    pub enabled: bool,
    /// Number of sales transactions.
    pub sales: usize,
    /// Number of food delivery orders.
    pub food_orders: usize,
    /// Number of SaaS subscriptions.
    pub subscriptions: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sales: 500,
            food_orders: 500,
            subscriptions: 300,
        }
    }
}

/// A file imported at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSource {
    /// Target analytics type identifier.
    pub analytics_type: String,
    /// CSV or JSON file; the extension picks the format.
    pub path: PathBuf,
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub demo: DemoConfig,
    pub imports: Vec<ImportSource>,
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads the file named by `POLYSTAT_CONFIG` when set, falling back to
    /// defaults, then applies `POLYSTAT_HOST` / `POLYSTAT_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => load_config(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies host/port overrides from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup(HOST_ENV) {
            self.server.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("{PORT_ENV}={port}")))?;
        }
        Ok(())
    }

    /// Checks that every startup import names a known analytics type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for source in &self.imports {
            source.analytics_type.parse::<AnalyticsType>()?;
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Parses configuration from TOML text. Missing keys take their defaults.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}
