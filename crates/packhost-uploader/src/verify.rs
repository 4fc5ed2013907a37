//! SHA-1 integrity checks against the digest reported by the service

use sha1::{Digest, Sha1};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("SHA-1 mismatch: expected {expected}, got {actual}")]
pub struct ChecksumMismatch {
    pub expected: String,
    pub actual: String,
}

/// Incremental SHA-1 over streamed chunks
#[derive(Default)]
pub struct PackHasher {
    inner: Sha1,
}

impl PackHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Lowercase hex digest
    pub fn finish(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// Lowercase hex SHA-1 of `data`
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Compare a computed digest with the expected one, ignoring case
pub fn check_sha1(actual: &str, expected: &str) -> Result<(), ChecksumMismatch> {
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(ChecksumMismatch {
            expected: expected.trim().to_lowercase(),
            actual: actual.to_string(),
        })
    }
}
