//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the backend token may be
//! supplied through the `MODELRUN_API_TOKEN` environment variable instead.
//!
//! # Example
//!
//! ```no_run
//! use modelrun::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::polling::PollingConfig;
use crate::adapter::outbound::http::settings::BackendConfig;
use crate::error::{ConfigError, Result};

/// Environment variable that overrides `backend.api_token`.
pub const API_TOKEN_ENV: &str = "MODELRUN_API_TOKEN";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Job tracking and normalization limits.
    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// A non-empty `MODELRUN_API_TOKEN` replaces the token from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.backend.api_token = Some(token);
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "backend.base_url",
            }
            .into());
        }
        let parsed = url::Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            field: "backend.base_url",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url",
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            }
            .into());
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.backend.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.connect_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.polling.batch_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.batch_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.polling.max_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.max_retry_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.polling.pixel_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.pixel_budget",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.polling.batch_interval_ms, 1000);
        assert_eq!(config.polling.max_retry_attempts, 3);
        assert_eq!(config.polling.pixel_budget, 25_300_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
            [backend]
            base_url = "https://api.example.com"
            read_retries = 0

            [polling]
            batch_interval_ms = 250
            max_retry_attempts = 5

            [logging]
            level = "debug"
            format = "json"
        "#;
        let config = Config::parse_toml(toml).unwrap();
        assert_eq!(config.backend.base_url, "https://api.example.com");
        assert_eq!(config.backend.read_retries, 0);
        assert_eq!(config.polling.batch_interval_ms, 250);
        assert_eq!(config.polling.max_retry_attempts, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_zero_interval() {
        let err = Config::parse_toml("[polling]\nbatch_interval_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "polling.batch_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_retry_budget() {
        let err = Config::parse_toml("[polling]\nmax_retry_attempts = 0").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "polling.max_retry_attempts",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_base_url() {
        let err = Config::parse_toml("[backend]\nbase_url = \"  \"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "backend.base_url"
            })
        ));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = Config::parse_toml("[backend]\nbase_url = \"ftp://example.com\"").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::parse_toml("[backend").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
