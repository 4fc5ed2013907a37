//! Upload capability consumed by the workflow layer.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::UploadResult;

/// Anything that can push a resource pack to the hosting service.
///
/// `PackClient` is the HTTP implementation; `MockTransport` stands in
/// for it in tests.
#[async_trait]
pub trait PackTransport: Send + Sync {
    /// Upload one archive. A single attempt, no retries.
    async fn upload(&self, content: Bytes, filename: &str) -> Result<UploadResult>;
}
