//! Packhost Uploader - resource pack upload workflow
//!
//! Provides the client-side half of the pack hosting service:
//! - File acceptance at the selection boundary (zip only, size-capped)
//! - An upload state machine observed through a watch channel
//! - Derivation of `server.properties` snippets and copyable fragments
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   SelectedFile   ┌──────────────────┐
//! │ AcceptanceFilter │ ───────────────► │  UploadWorkflow  │
//! └──────────────────┘                  │  (WorkflowState) │
//!                                       └────────┬─────────┘
//!                         ┌──────────────────────┼───────────────┐
//!                         ▼                      ▼               ▼
//!                 ┌───────────────┐     ┌─────────────────┐  subscribers
//!                 │ PackTransport │     │    presenter    │
//!                 │ (PackClient)  │     │ (+ Clipboard)   │
//!                 └───────────────┘     └─────────────────┘
//! ```

pub mod acceptance;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod presenter;
pub mod verify;
pub mod workflow;

// Re-export main types for convenience
pub use acceptance::{AcceptanceFilter, SelectedFile, SelectionRejected};
pub use clipboard::{Clipboard, ClipboardError};
pub use config::{ConfigError, UploaderConfig, DEFAULT_MAX_PACK_SIZE};
pub use presenter::{server_properties, summary, CopyTarget};
pub use workflow::{UploadWorkflow, WorkflowState, NO_FILE_CHOSEN};

pub use packhost_client::{ClientConfig, PackClient, PackTransport, UploadResult};
