//! Rust client for the resource pack hosting API
//!
//! # Example
//!
//! ```rust,no_run
//! use packhost_client::{ClientConfig, PackClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PackClient::new(ClientConfig {
//!     base_url: "https://packs.example.com".into(),
//!     captcha_token: Some("static-token".into()),
//!     ..Default::default()
//! })?;
//!
//! // Upload a pack
//! let content = std::fs::read("pack.zip")?;
//! let result = client.upload(content.into(), "pack.zip").await?;
//!
//! // Look the hash up again later
//! let hash = client.fetch_hash(&result.pack_name()).await?;
//! assert_eq!(hash.sha1, result.sha1);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::{PackClient, PackStream};
pub use error::{ClientError, Result};
pub use mock::{MockOutcome, MockTransport};
pub use transport::PackTransport;
pub use types::*;
