//! Uploader configuration

use packhost_client::ClientConfig;
use thiserror::Error;
use url::Url;

/// Largest archive offered to the workflow (50 MiB)
pub const DEFAULT_MAX_PACK_SIZE: u64 = 50 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base URL {url:?} is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("base URL {0:?} must use http or https")]
    UnsupportedScheme(String),

    #[error("maximum pack size must be greater than zero")]
    ZeroMaxPackSize,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Everything the upload workflow needs from the environment
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Connection settings handed to the transport client
    pub client: ClientConfig,
    /// Size limit enforced by the acceptance filter
    pub max_pack_size: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            max_pack_size: DEFAULT_MAX_PACK_SIZE,
        }
    }
}

impl UploaderConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.client.base_url;
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            reason,
        };

        let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.clone()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        if self.max_pack_size == 0 {
            return Err(ConfigError::ZeroMaxPackSize);
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
