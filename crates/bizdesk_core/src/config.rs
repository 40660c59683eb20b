//! Layered service configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`BIZDESK_*` prefix, `__` separates sections)
//! 2. A TOML file (`bizdesk.toml` in the working directory, or an explicit path)
//! 3. Built-in defaults
//!
//! `BIZDESK_SERVER__BIND=0.0.0.0:9000` maps to `server.bind`.

use crate::logging::normalize_level;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "bizdesk.toml";
pub const ENV_PREFIX: &str = "BIZDESK_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),
    #[error("config file `{0}` does not exist")]
    MissingFile(PathBuf),
    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    /// Upper bound for JSON request bodies.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bizdesk.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Rolling log directory; logs go to stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BizConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BizConfig {
    /// Loads and validates configuration.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }
        let config: Self = Self::figment(config_path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the provider chain without extracting it.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_body_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path",
                reason: "must not be empty".to_string(),
            });
        }
        normalize_level(&self.logging.level).map_err(|err| ConfigError::InvalidValue {
            field: "logging.level",
            reason: err.to_string(),
        })?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .trim()
            .parse()
            .map_err(|err| ConfigError::InvalidValue {
                field: "server.bind",
                reason: format!("`{}`: {err}", self.server.bind),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::BizConfig;

    #[test]
    fn defaults_are_valid() {
        let config = BizConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn unparseable_bind_is_rejected() {
        let mut config = BizConfig::default();
        config.server.bind = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }
}
