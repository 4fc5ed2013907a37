//! Types for the pack hosting API

use serde::{Deserialize, Serialize};

/// Header carrying the static anti-abuse token
pub const CAPTCHA_HEADER: &str = "X-Captcha-Token";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the pack hosting API
    pub base_url: String,
    /// Static anti-abuse token sent with every request
    pub captcha_token: Option<String>,
    /// Request timeout in seconds (default: 300)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            captcha_token: None,
            timeout_secs: 300,
        }
    }
}

/// Response from the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Absolute URL the pack can be fetched from
    pub download_url: String,
    /// SHA-1 of the stored archive (lowercase hex)
    pub sha1: String,
    /// Capability required to delete the pack later
    pub delete_key: String,
}

impl UploadResult {
    /// Pack name as used by the hash, download and delete endpoints.
    ///
    /// Derived from the last path segment of the download URL.
    pub fn pack_name(&self) -> String {
        let path = self
            .download_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let segment = path.rsplit('/').next().unwrap_or_default();
        let decoded = urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        pack_stem(&decoded).to_string()
    }

    /// Whether `sha1` is a 40 character lowercase hex digest
    pub fn has_valid_sha1(&self) -> bool {
        is_sha1_hex(&self.sha1)
    }
}

/// Response from the hash lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResponse {
    pub sha1: String,
}

/// Response from the delete endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Failure body returned by the service
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Detail as display text. Empty or null details count as absent.
    pub fn detail_text(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

/// Strip a trailing `.zip` (any case) from a pack filename
pub fn pack_stem(filename: &str) -> &str {
    let len = filename.len();
    if len > 4 && filename.is_char_boundary(len - 4) && filename[len - 4..].eq_ignore_ascii_case(".zip") {
        &filename[..len - 4]
    } else {
        filename
    }
}

/// Whether `value` looks like a lowercase hex SHA-1 digest
pub fn is_sha1_hex(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
