//! Configuration module for Pitchlens
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PITCHLENS_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use pitchlens::config::PitchlensConfig;
//!
//! let config = PitchlensConfig::default();
//! assert_eq!(config.render.width, 640);
//!
//! let toml = r#"
//! [server]
//! base_url = "https://analysis.example.com"
//! "#;
//! let config: PitchlensConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.base_url, "https://analysis.example.com");
//! ```

pub mod advisory;
pub mod decode;
pub mod error;
pub mod logging;
pub mod render;
pub mod server;

pub use advisory::AdvisoryConfig;
pub use decode::{DecodeConfig, EmbeddedEncoding};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use render::{PlacementPolicy, RenderConfig};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Pitchlens client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PitchlensConfig {
    /// Analysis service endpoints and timeouts
    pub server: ServerConfig,
    /// Render surface size and placement policy
    pub render: RenderConfig,
    /// Embedded image encoding
    pub decode: DecodeConfig,
    /// Advisory rule thresholds
    pub advisory: AdvisoryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl PitchlensConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports PITCHLENS_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("PITCHLENS_BASE_URL") {
            self.server.base_url = url;
        }

        if let Ok(level) = std::env::var("PITCHLENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PITCHLENS_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(placement) = std::env::var("PITCHLENS_PLACEMENT") {
            if let Ok(p) = placement.parse() {
                self.render.placement = p;
            }
        }
        if let Ok(encoding) = std::env::var("PITCHLENS_EMBEDDED_ENCODING") {
            if let Ok(e) = encoding.parse() {
                self.decode.embedded_encoding = e;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.server.base_url).map_err(|e| {
            ConfigError::Validation {
                field: "server.base_url".to_string(),
                message: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "server.base_url".to_string(),
                message: format!("scheme must be http or https, got '{}'", url.scheme()),
            });
        }

        for (field, path) in [
            ("server.upload_path", &self.server.upload_path),
            ("server.stream_path", &self.server.stream_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "path must start with '/'".to_string(),
                });
            }
        }

        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Validation {
                field: "render".to_string(),
                message: "surface width and height must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
