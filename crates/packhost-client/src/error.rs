//! Error types for the pack client

use thiserror::Error;

/// Pack client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network fault or undecodable response body
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("request failed with status code {status}")]
    Server {
        status: u16,
        /// `detail` field of the failure body, if the server sent one
        detail: Option<String>,
    },

    /// Client configuration cannot be turned into a request
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Response was received but does not match the API contract
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// HTTP status of a server failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-supplied detail, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Text shown to the user for this failure.
    ///
    /// The server's `detail` wins when present; otherwise the error's own
    /// description is used.
    pub fn user_message(&self) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => self.to_string(),
        }
    }
}

/// Result type for pack client operations
pub type Result<T> = std::result::Result<T, ClientError>;
