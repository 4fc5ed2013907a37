//! Upload workflow state machine.
//!
//! ```text
//! Idle ──select──► FileSelected ──confirm──► Uploading ──ok──► Succeeded
//!   │                  ▲   ▲                   │  │
//!   │ confirm          │   └──────cancel───────┘  └─err──► Failed(file)
//!   ▼                  │                                      │
//! Failed(none) ──select┴──────────────select──────────────────┘
//! ```
//!
//! The current [`WorkflowState`] lives in a watch channel. Observers call
//! [`UploadWorkflow::subscribe`] and see every transition; only the
//! workflow writes to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use packhost_client::{PackTransport, UploadResult};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acceptance::SelectedFile;

/// Error shown when an upload is confirmed before any file was selected
pub const NO_FILE_CHOSEN: &str = "no file chosen";

/// Where the workflow currently stands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Idle,
    FileSelected(SelectedFile),
    Uploading(SelectedFile),
    Succeeded(UploadResult),
    Failed(Option<SelectedFile>, String),
}

impl WorkflowState {
    /// File the next confirm would upload, or the one in flight
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        match self {
            WorkflowState::FileSelected(file)
            | WorkflowState::Uploading(file)
            | WorkflowState::Failed(Some(file), _) => Some(file),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&UploadResult> {
        match self {
            WorkflowState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WorkflowState::Failed(_, message) => Some(message),
            _ => None,
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, WorkflowState::Uploading(_))
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::FileSelected(_) => "file_selected",
            WorkflowState::Uploading(_) => "uploading",
            WorkflowState::Succeeded(_) => "succeeded",
            WorkflowState::Failed(..) => "failed",
        }
    }
}

/// What a confirm call decided under the state lock
enum Begin {
    Upload(SelectedFile),
    NoFile,
    Ignored,
}

/// Drives one upload at a time through the transport.
pub struct UploadWorkflow {
    transport: Arc<dyn PackTransport>,
    state: watch::Sender<WorkflowState>,
    /// Cancellation handle of the upload in flight
    in_flight: Mutex<Option<CancellationToken>>,
}

impl UploadWorkflow {
    pub fn new(transport: Arc<dyn PackTransport>) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        Self {
            transport,
            state,
            in_flight: Mutex::new(None),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state transition
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn is_uploading(&self) -> bool {
        self.state.borrow().is_uploading()
    }

    /// Make `file` the current selection, dropping any previous result or
    /// error.
    ///
    /// Ignored while an upload is in flight; returns whether the selection
    /// was applied.
    pub fn select_file(&self, file: SelectedFile) -> bool {
        let name = file.name().to_string();
        let size = file.size();

        let applied = self.state.send_if_modified(move |state| {
            if state.is_uploading() {
                return false;
            }
            *state = WorkflowState::FileSelected(file);
            true
        });

        if applied {
            debug!(name = %name, size, "File selected");
        } else {
            debug!(name = %name, "Selection ignored while uploading");
        }
        applied
    }

    /// Upload the selected file and wait for the outcome.
    ///
    /// - No selection: moves to `Failed(None, NO_FILE_CHOSEN)` without any
    ///   transport call.
    /// - `FileSelected` or `Failed` with a file: uploads it once.
    /// - `Uploading` or `Succeeded`: no-op.
    ///
    /// Returns the state this call left behind.
    pub async fn confirm_upload(&self) -> WorkflowState {
        let token = CancellationToken::new();

        let file = match self.begin(&token) {
            Begin::Upload(file) => file,
            Begin::NoFile => {
                debug!("Upload confirmed without a selected file");
                return self.state();
            }
            Begin::Ignored => {
                let state = self.state();
                debug!(state = state.label(), "Confirm ignored");
                return state;
            }
        };

        info!(name = file.name(), size = file.size(), "Uploading resource pack");
        let mut guard = UploadGuard {
            workflow: self,
            file: Some(file.clone()),
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = self.transport.upload(file.content(), file.name()) => Some(result),
        };
        // Later cancels find nothing in flight; an earlier one wins over the result
        self.lock_in_flight().take();
        let outcome = if token.is_cancelled() { None } else { outcome };
        guard.disarm();

        let next = match outcome {
            Some(Ok(result)) => {
                info!(download_url = %result.download_url, sha1 = %result.sha1, "Upload succeeded");
                WorkflowState::Succeeded(result)
            }
            Some(Err(e)) => {
                warn!(name = file.name(), error = %e, "Upload failed");
                WorkflowState::Failed(Some(file), e.user_message())
            }
            None => {
                info!(name = file.name(), "Upload cancelled");
                WorkflowState::FileSelected(file)
            }
        };

        self.finish(next.clone());
        next
    }

    /// Abort the upload in flight, returning to `FileSelected`.
    ///
    /// Returns whether there was anything to cancel.
    pub fn cancel(&self) -> bool {
        match self.lock_in_flight().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Atomically decide what a confirm does and apply the first transition.
    fn begin(&self, token: &CancellationToken) -> Begin {
        let mut in_flight = self.lock_in_flight();
        let mut begin = Begin::Ignored;

        self.state.send_if_modified(|state| {
            begin = match state {
                WorkflowState::FileSelected(file) | WorkflowState::Failed(Some(file), _) => {
                    Begin::Upload(file.clone())
                }
                WorkflowState::Idle | WorkflowState::Failed(None, _) => Begin::NoFile,
                WorkflowState::Uploading(_) | WorkflowState::Succeeded(_) => Begin::Ignored,
            };
            match &begin {
                Begin::Upload(file) => {
                    *state = WorkflowState::Uploading(file.clone());
                    true
                }
                Begin::NoFile => {
                    *state = WorkflowState::Failed(None, NO_FILE_CHOSEN.to_string());
                    true
                }
                Begin::Ignored => false,
            }
        });

        if matches!(begin, Begin::Upload(_)) {
            *in_flight = Some(token.clone());
        }
        begin
    }

    /// Leave `Uploading` for `next` and forget the cancellation handle.
    fn finish(&self, next: WorkflowState) {
        let mut in_flight = self.lock_in_flight();
        *in_flight = None;
        self.state.send_replace(next);
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Puts the file back into `FileSelected` if a confirm future is dropped
/// mid-upload.
struct UploadGuard<'a> {
    workflow: &'a UploadWorkflow,
    file: Option<SelectedFile>,
}

impl UploadGuard<'_> {
    fn disarm(&mut self) {
        self.file = None;
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            warn!(name = file.name(), "Upload abandoned");
            self.workflow.finish(WorkflowState::FileSelected(file));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptance::AcceptanceFilter;
    use bytes::Bytes;
    use packhost_client::MockTransport;

    fn pack(name: &str) -> SelectedFile {
        AcceptanceFilter::default()
            .accept(name, None, Bytes::from_static(b"PK\x03\x04"))
            .unwrap()
    }

    fn sample() -> UploadResult {
        UploadResult {
            download_url: "https://cdn.example/pack123.zip".to_string(),
            sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string(),
            delete_key: "k-xyz".to_string(),
        }
    }

    #[test]
    fn test_state_accessors() {
        let file = pack("a.zip");
        assert_eq!(WorkflowState::default(), WorkflowState::Idle);
        assert_eq!(WorkflowState::FileSelected(file.clone()).selected_file(), Some(&file));
        assert_eq!(
            WorkflowState::Failed(Some(file.clone()), "boom".into()).error(),
            Some("boom")
        );
        assert!(WorkflowState::Uploading(file).is_uploading());
        assert_eq!(WorkflowState::Succeeded(sample()).result(), Some(&sample()));
        assert_eq!(WorkflowState::Failed(None, String::new()).label(), "failed");
    }

    #[tokio::test]
    async fn test_failure_keeps_file_for_retry() {
        let transport = Arc::new(MockTransport::failing(500, None));
        let workflow = UploadWorkflow::new(transport.clone());

        workflow.select_file(pack("a.zip"));
        let state = workflow.confirm_upload().await;
        assert_eq!(
            state,
            WorkflowState::Failed(Some(pack("a.zip")), "request failed with status code 500".into())
        );

        transport.set_outcome(packhost_client::MockOutcome::Success(sample()));
        let state = workflow.confirm_upload().await;
        assert_eq!(state, WorkflowState::Succeeded(sample()));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_confirm_after_success_is_ignored() {
        let transport = Arc::new(MockTransport::succeeding(sample()));
        let workflow = UploadWorkflow::new(transport.clone());

        workflow.select_file(pack("a.zip"));
        workflow.confirm_upload().await;
        let state = workflow.confirm_upload().await;

        assert_eq!(state, WorkflowState::Succeeded(sample()));
        assert_eq!(transport.call_count(), 1);
    }

    /// Cancels the workflow from inside the upload, then succeeds anyway
    #[derive(Default)]
    struct CancellingTransport {
        workflow: std::sync::OnceLock<std::sync::Weak<UploadWorkflow>>,
        cancel_accepted: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl PackTransport for CancellingTransport {
        async fn upload(&self, _content: Bytes, _filename: &str) -> packhost_client::Result<UploadResult> {
            if let Some(workflow) = self.workflow.get().and_then(std::sync::Weak::upgrade) {
                self.cancel_accepted
                    .store(workflow.cancel(), std::sync::atomic::Ordering::SeqCst);
            }
            Ok(sample())
        }
    }

    #[tokio::test]
    async fn test_accepted_cancel_wins_over_completed_upload() {
        let transport = Arc::new(CancellingTransport::default());
        let workflow = Arc::new(UploadWorkflow::new(transport.clone()));
        transport.workflow.set(Arc::downgrade(&workflow)).unwrap();

        workflow.select_file(pack("a.zip"));
        let state = workflow.confirm_upload().await;

        assert!(transport.cancel_accepted.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(state, WorkflowState::FileSelected(pack("a.zip")));
        assert!(!workflow.cancel());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_refused() {
        let workflow = UploadWorkflow::new(Arc::new(MockTransport::succeeding(sample())));

        workflow.select_file(pack("a.zip"));
        assert_eq!(workflow.confirm_upload().await, WorkflowState::Succeeded(sample()));
        assert!(!workflow.cancel());
        assert_eq!(workflow.state(), WorkflowState::Succeeded(sample()));
    }

    #[test]
    fn test_cancel_without_upload() {
        let workflow = UploadWorkflow::new(Arc::new(MockTransport::succeeding(sample())));
        assert!(!workflow.cancel());
    }
}
