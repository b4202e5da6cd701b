//! Client configuration
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;
use crate::error::{Error, Result};

/// Environment variable prefix for polis configuration
pub const ENV_PREFIX: &str = "POLIS_";

/// Base trait for all configuration types
pub trait Configuration: Serialize + for<'de> Deserialize<'de> + Default {
    /// Validate the configuration
    fn validate(&self) -> Result<()>;

    /// Load configuration from a file
    fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

/// Delays after which terminal transaction notices disappear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_success_clear_ms")]
    pub success_clear_ms: u64,

    #[serde(default = "default_error_clear_ms")]
    pub error_clear_ms: u64,
}

fn default_success_clear_ms() -> u64 {
    2000
}

fn default_error_clear_ms() -> u64 {
    3000
}

impl NotificationConfig {
    pub fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_clear_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_clear_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_clear_ms: default_success_clear_ms(),
            error_clear_ms: default_error_clear_ms(),
        }
    }
}

/// Settings for a proposal client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root directory of the file-backed store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Wallet address used as the author of new proposals. No address means
    /// no signer is attached and every write is refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("polis-data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            author: None,
            notifications: NotificationConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Apply `POLIS_*` environment variable overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            let value = lookup(&format!("{}{}", ENV_PREFIX, name));
            if value.is_some() {
                debug!("Overriding config from {}{}", ENV_PREFIX, name);
            }
            value
        };

        if let Some(dir) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if let Some(author) = var("AUTHOR") {
            let author = author.trim().to_string();
            self.author = if author.is_empty() { None } else { Some(author) };
        }

        self.validate()?;
        Ok(self)
    }
}

impl Configuration for ClientConfig {
    fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {},
            _ => return Err(Error::configuration(format!(
                "Invalid log level: {}", self.log_level
            ))),
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::validation("data_dir cannot be empty"));
        }

        if let Some(author) = &self.author {
            if author.trim().is_empty() {
                return Err(Error::validation("author cannot be blank"));
            }
        }

        Ok(())
    }
}
