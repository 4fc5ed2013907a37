//! Upload workflow behaviour against mock and HTTP-backed transports

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use packhost_client::{ClientConfig, MockTransport, PackClient, UploadResult};
use packhost_uploader::acceptance::SelectionRejected;
use packhost_uploader::{
    server_properties, AcceptanceFilter, SelectedFile, UploadWorkflow, WorkflowState, NO_FILE_CHOSEN,
};
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pack(name: &str) -> SelectedFile {
    AcceptanceFilter::default()
        .accept(name, Some("application/zip"), Bytes::from_static(b"PK\x03\x04archive"))
        .unwrap()
}

fn sample() -> UploadResult {
    UploadResult {
        download_url: "https://cdn.example/pack123.zip".to_string(),
        sha1: "a3f5e91a3f5e91a3f5e91a3f5e91a3f5e91a3f5e".to_string(),
        delete_key: "k-xyz".to_string(),
    }
}

fn gated(result: UploadResult) -> (Arc<MockTransport>, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(MockTransport::succeeding(result).with_gate(gate.clone()));
    (transport, gate)
}

#[tokio::test]
async fn test_successful_upload_exposes_exact_result() {
    let transport = Arc::new(MockTransport::succeeding(sample()));
    let workflow = UploadWorkflow::new(transport.clone());

    assert!(workflow.select_file(pack("pack123.zip")));
    let state = workflow.confirm_upload().await;

    assert_eq!(state, WorkflowState::Succeeded(sample()));
    assert_eq!(workflow.state(), WorkflowState::Succeeded(sample()));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(transport.last_filename().as_deref(), Some("pack123.zip"));

    let result = state.result().unwrap();
    assert_eq!(
        server_properties(result),
        "resource-pack=https://cdn.example/pack123.zip\nresource-pack-sha1=a3f5e91a3f5e91a3f5e91a3f5e91a3f5e91a3f5e"
    );
}

#[tokio::test]
async fn test_rejected_files_never_reach_the_workflow() {
    let filter = AcceptanceFilter::new(8);

    let not_zip = filter.accept("notes.txt", Some("text/plain"), Bytes::from_static(b"hi"));
    assert!(matches!(not_zip, Err(SelectionRejected::NotZip { .. })));

    let too_large = filter.accept("big.zip", None, Bytes::from(vec![0u8; 9]));
    assert!(matches!(too_large, Err(SelectionRejected::TooLarge { size: 9, max: 8, .. })));

    let none = filter.accept_single::<&str>(&[]).await;
    assert!(matches!(none, Err(SelectionRejected::NoFile)));

    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.zip");
    let b = dir.path().join("b.zip");
    tokio::fs::write(&a, b"PK").await.unwrap();
    tokio::fs::write(&b, b"PK").await.unwrap();
    let many = filter.accept_single(&[a, b]).await;
    assert!(matches!(many, Err(SelectionRejected::TooManyFiles(2))));

    let transport = Arc::new(MockTransport::succeeding(sample()));
    let workflow = UploadWorkflow::new(transport.clone());
    assert_eq!(workflow.state(), WorkflowState::Idle);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_confirm_without_selection_fails_without_transport_call() {
    let transport = Arc::new(MockTransport::succeeding(sample()));
    let workflow = UploadWorkflow::new(transport.clone());

    let state = workflow.confirm_upload().await;
    assert_eq!(state, WorkflowState::Failed(None, NO_FILE_CHOSEN.to_string()));

    // Still nothing to upload on a second attempt
    let state = workflow.confirm_upload().await;
    assert_eq!(state.error(), Some(NO_FILE_CHOSEN));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_confirm_while_uploading_is_ignored() {
    let (transport, gate) = gated(sample());
    let workflow = Arc::new(UploadWorkflow::new(transport.clone()));
    workflow.select_file(pack("pack123.zip"));

    let mut rx = workflow.subscribe();
    let first = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.confirm_upload().await }
    });
    rx.wait_for(|s| s.is_uploading()).await.unwrap();

    let second = workflow.confirm_upload().await;
    assert!(second.is_uploading());
    assert!(workflow.is_uploading());

    gate.notify_one();
    let first = first.await.unwrap();

    assert_eq!(first, WorkflowState::Succeeded(sample()));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_selection_ignored_while_uploading() {
    let (transport, gate) = gated(sample());
    let workflow = Arc::new(UploadWorkflow::new(transport));
    workflow.select_file(pack("first.zip"));

    let mut rx = workflow.subscribe();
    let upload = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.confirm_upload().await }
    });
    rx.wait_for(|s| s.is_uploading()).await.unwrap();

    assert!(!workflow.select_file(pack("second.zip")));
    assert_eq!(workflow.state(), WorkflowState::Uploading(pack("first.zip")));

    gate.notify_one();
    upload.await.unwrap();
}

#[tokio::test]
async fn test_new_selection_clears_previous_result() {
    let transport = Arc::new(MockTransport::succeeding(sample()));
    let workflow = UploadWorkflow::new(transport);

    workflow.select_file(pack("pack123.zip"));
    workflow.confirm_upload().await;
    assert!(workflow.state().result().is_some());

    assert!(workflow.select_file(pack("next.zip")));
    let state = workflow.state();
    assert_eq!(state, WorkflowState::FileSelected(pack("next.zip")));
    assert!(state.result().is_none());
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_new_selection_clears_previous_error() {
    let workflow = UploadWorkflow::new(Arc::new(MockTransport::failing(500, None)));

    workflow.select_file(pack("a.zip"));
    workflow.confirm_upload().await;
    assert!(workflow.state().error().is_some());

    workflow.select_file(pack("b.zip"));
    assert_eq!(workflow.state(), WorkflowState::FileSelected(pack("b.zip")));
}

#[tokio::test]
async fn test_server_detail_is_shown_verbatim() {
    let workflow = UploadWorkflow::new(Arc::new(MockTransport::failing(413, Some("file too large"))));

    workflow.select_file(pack("huge.zip"));
    let state = workflow.confirm_upload().await;

    assert_eq!(
        state,
        WorkflowState::Failed(Some(pack("huge.zip")), "file too large".to_string())
    );
}

#[tokio::test]
async fn test_missing_detail_falls_back_to_generic_message() {
    let workflow = UploadWorkflow::new(Arc::new(MockTransport::failing(502, None)));

    workflow.select_file(pack("a.zip"));
    let state = workflow.confirm_upload().await;

    assert_eq!(state.error(), Some("request failed with status code 502"));
    assert_eq!(state.selected_file(), Some(&pack("a.zip")));
}

#[tokio::test]
async fn test_cancel_returns_to_file_selected() {
    let (transport, _gate) = gated(sample());
    let workflow = Arc::new(UploadWorkflow::new(transport.clone()));
    workflow.select_file(pack("pack123.zip"));

    let mut rx = workflow.subscribe();
    let upload = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.confirm_upload().await }
    });
    rx.wait_for(|s| s.is_uploading()).await.unwrap();

    assert!(workflow.cancel());
    let state = upload.await.unwrap();

    assert_eq!(state, WorkflowState::FileSelected(pack("pack123.zip")));
    assert_eq!(workflow.state(), state);
    assert!(!workflow.cancel());
}

#[tokio::test]
async fn test_dropped_confirm_restores_selection() {
    let (transport, _gate) = gated(sample());
    let workflow = UploadWorkflow::new(transport);
    workflow.select_file(pack("pack123.zip"));

    let outcome = tokio::time::timeout(Duration::from_millis(50), workflow.confirm_upload()).await;

    assert!(outcome.is_err());
    assert_eq!(workflow.state(), WorkflowState::FileSelected(pack("pack123.zip")));
    assert!(!workflow.is_uploading());
}

#[tokio::test]
async fn test_subscribers_observe_transitions() {
    let (transport, gate) = gated(sample());
    let workflow = Arc::new(UploadWorkflow::new(transport));
    let mut rx = workflow.subscribe();

    workflow.select_file(pack("pack123.zip"));
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), WorkflowState::FileSelected(pack("pack123.zip")));

    let upload = tokio::spawn({
        let workflow = workflow.clone();
        async move { workflow.confirm_upload().await }
    });
    rx.wait_for(|s| s.is_uploading()).await.unwrap();

    gate.notify_one();
    let seen = rx.wait_for(|s| s.result().is_some()).await.unwrap().clone();
    assert_eq!(seen, WorkflowState::Succeeded(sample()));

    upload.await.unwrap();
}

#[tokio::test]
async fn test_workflow_over_http_client() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "download_url": "https://cdn.example/pack123.zip",
            "sha1": "a3f5e91a3f5e91a3f5e91a3f5e91a3f5e91a3f5e",
            "delete_key": "k-xyz",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PackClient::new(ClientConfig {
        base_url: server.uri(),
        captcha_token: None,
        timeout_secs: 5,
    })
    .unwrap();
    let workflow = UploadWorkflow::new(Arc::new(client));

    workflow.select_file(pack("pack123.zip"));
    assert_eq!(workflow.confirm_upload().await, WorkflowState::Succeeded(sample()));
}

#[tokio::test]
async fn test_workflow_over_http_client_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({ "detail": "file too large" })))
        .mount(&server)
        .await;

    let client = PackClient::new(ClientConfig {
        base_url: server.uri(),
        captcha_token: None,
        timeout_secs: 5,
    })
    .unwrap();
    let workflow = UploadWorkflow::new(Arc::new(client));

    workflow.select_file(pack("huge.zip"));
    let state = workflow.confirm_upload().await;
    assert_eq!(state.error(), Some("file too large"));
}
