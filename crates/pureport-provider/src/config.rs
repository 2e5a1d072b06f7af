//! Provider configuration, read from TOML.
//!
//! ```toml
//! endpoint = "https://api.pureport.com"
//! log_filter = "pureport_provider=debug,info"
//! channel_buffer = 64
//! ```
//!
//! Every key is optional. `PUREPORT_ENDPOINT` overrides `endpoint`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use url::Url;

pub const ENDPOINT_ENV: &str = "PUREPORT_ENDPOINT";

const DEFAULT_ENDPOINT: &str = "https://api.pureport.com";

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed into the expected structure.
    #[error("toml error: {0}")]
    CannotParseToml(String),

    #[error("endpoint {endpoint:?} is not a valid http(s) URL: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("channel_buffer must be at least 1")]
    EmptyChannelBuffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the provisioning API.
    pub endpoint: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Request queue depth of each simulated API collection.
    pub channel_buffer: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            log_filter: "info".to_string(),
            channel_buffer: 32,
        }
    }
}

impl ProviderConfig {
    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(config_str).map_err(|e| ConfigError::CannotParseToml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file, then applies the environment override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)?.with_endpoint_override(std::env::var(ENDPOINT_ENV).ok())
    }

    /// Defaults plus the environment override.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_endpoint_override(std::env::var(ENDPOINT_ENV).ok())
    }

    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Result<Self, ConfigError> {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {other}"))),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        if self.channel_buffer == 0 {
            return Err(ConfigError::EmptyChannelBuffer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(ProviderConfig::from_toml("").unwrap(), ProviderConfig::default());
    }

    #[test]
    fn keys_override_defaults() {
        let config = ProviderConfig::from_toml(
            r#"
            endpoint = "http://localhost:8080"
            channel_buffer = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.channel_buffer, 4);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProviderConfig::from_toml("endpont = \"https://x\"").unwrap_err();
        assert!(matches!(err, ConfigError::CannotParseToml(_)));
    }

    #[test]
    fn endpoint_must_be_http() {
        let err = ProviderConfig::from_toml("endpoint = \"ftp://api.pureport.com\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));

        let err = ProviderConfig::from_toml("endpoint = \"not a url\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let err = ProviderConfig::from_toml("channel_buffer = 0").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyChannelBuffer));
    }

    #[test]
    fn endpoint_override_wins_when_present() {
        let config = ProviderConfig::default()
            .with_endpoint_override(Some("https://staging.pureport.com".into()))
            .unwrap();
        assert_eq!(config.endpoint, "https://staging.pureport.com");

        let config = ProviderConfig::default()
            .with_endpoint_override(Some("  ".into()))
            .unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }
}
