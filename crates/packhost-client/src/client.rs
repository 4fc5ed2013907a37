//! HTTP client for the pack hosting API

use crate::error::{ClientError, Result};
use crate::transport::PackTransport;
use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{header, multipart, Client};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw archive bytes as they arrive from the download endpoint
pub type PackStream = BoxStream<'static, Result<Bytes>>;

/// HTTP client for the pack hosting API
///
/// Every request carries the configured anti-abuse token. No cookie store
/// is enabled, so credentials are never sent.
///
/// # Example
///
/// ```rust,no_run
/// use packhost_client::{ClientConfig, PackClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PackClient::new(ClientConfig {
///     base_url: "https://packs.example.com".into(),
///     ..Default::default()
/// })?;
///
/// let hash = client.fetch_hash("pack123").await?;
/// let deleted = client.delete("pack123", "k-xyz").await?;
/// # Ok(())
/// # }
/// ```
pub struct PackClient {
    config: ClientConfig,
    client: Client,
}

impl PackClient {
    /// Create a new pack client
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("base URL {:?}: {}", config.base_url, e))
        })?;
        let trimmed = config.base_url.trim_end_matches('/').len();
        config.base_url.truncate(trimmed);

        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = config.captcha_token {
            let value = header::HeaderValue::from_str(token).map_err(|_| {
                ClientError::InvalidConfig("captcha token is not a valid header value".to_string())
            })?;
            headers.insert(CAPTCHA_HEADER, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // ==================== Pack API ====================

    /// Upload an archive as the multipart field `file`
    pub async fn upload(&self, content: Bytes, filename: &str) -> Result<UploadResult> {
        let url = format!("{}/upload", self.config.base_url);
        let size = content.len() as u64;

        let part = multipart::Part::stream_with_length(content, size)
            .file_name(filename.to_string())
            .mime_str("application/zip")?;
        let form = multipart::Form::new().part("file", part);

        debug!(filename, size, "Uploading pack");
        let response = self.client.post(&url).multipart(form).send().await?;
        let result: UploadResult = self.handle_response(response).await?;

        if !result.has_valid_sha1() {
            warn!(sha1 = %result.sha1, "Service returned a malformed SHA-1");
        }
        info!(download_url = %result.download_url, "Pack uploaded");
        Ok(result)
    }

    /// Look up the SHA-1 of a stored pack
    pub async fn fetch_hash(&self, filename: &str) -> Result<HashResponse> {
        let response = self
            .client
            .get(self.pack_url(filename))
            .query(&[("sha-1", "true")])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Stream the raw archive bytes of a stored pack
    pub async fn download(&self, filename: &str) -> Result<PackStream> {
        let response = self.client.get(self.pack_url(filename)).send().await?;
        let response = self.check_status(response).await?;

        debug!(filename, length = ?response.content_length(), "Downloading pack");
        Ok(response.bytes_stream().map_err(ClientError::from).boxed())
    }

    /// Delete a stored pack using the key handed out at upload time
    pub async fn delete(&self, filename: &str, delete_key: &str) -> Result<DeleteResponse> {
        let response = self
            .client
            .get(self.pack_url(filename))
            .query(&[("delete", "true"), ("key", delete_key)])
            .send()
            .await?;

        let deleted: DeleteResponse = self.handle_response(response).await?;
        info!(filename, "Pack deleted");
        Ok(deleted)
    }

    // ==================== Helper Methods ====================

    fn pack_url(&self, filename: &str) -> String {
        format!(
            "{}/packs/{}.zip",
            self.config.base_url,
            urlencoding::encode(pack_stem(filename))
        )
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::detail_text);

        debug!(status = status.as_u16(), detail = ?detail, "Pack service request failed");
        Err(ClientError::Server {
            status: status.as_u16(),
            detail,
        })
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PackTransport for PackClient {
    async fn upload(&self, content: Bytes, filename: &str) -> Result<UploadResult> {
        PackClient::upload(self, content, filename).await
    }
}
