//! Mock pack transport for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::{ClientError, Result};
use crate::transport::PackTransport;
use crate::types::UploadResult;

/// What the mock answers to an upload.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(UploadResult),
    Failure { status: u16, detail: Option<String> },
}

/// Mock transport for testing.
///
/// Answers every upload with a configurable outcome and counts calls.
/// With a gate attached, each upload waits for one `notify_one` before
/// answering, which keeps it observably in flight.
pub struct MockTransport {
    outcome: Mutex<MockOutcome>,
    call_count: AtomicU32,
    last_filename: Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    /// Create a mock answering with `outcome`.
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            call_count: AtomicU32::new(0),
            last_filename: Mutex::new(None),
            gate: None,
        }
    }

    /// Create a mock whose uploads succeed with `result`.
    pub fn succeeding(result: UploadResult) -> Self {
        Self::new(MockOutcome::Success(result))
    }

    /// Create a mock whose uploads fail with `status` and an optional detail.
    pub fn failing(status: u16, detail: Option<&str>) -> Self {
        Self::new(MockOutcome::Failure {
            status,
            detail: detail.map(str::to_string),
        })
    }

    /// Hold every upload until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the outcome for subsequent uploads.
    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = outcome;
    }

    /// Get the number of times upload was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Filename passed to the most recent upload.
    pub fn last_filename(&self) -> Option<String> {
        self.last_filename
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PackTransport for MockTransport {
    async fn upload(&self, _content: Bytes, filename: &str) -> Result<UploadResult> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_filename.lock().unwrap_or_else(|e| e.into_inner()) = Some(filename.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let outcome = self.outcome.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match outcome {
            MockOutcome::Success(result) => Ok(result),
            MockOutcome::Failure { status, detail } => Err(ClientError::Server { status, detail }),
        }
    }
}
