//! Display strings derived from an upload result.
//!
//! Everything here is a pure function of an [`UploadResult`]; copying to a
//! clipboard goes through a [`Clipboard`] supplied by the caller.

use packhost_client::UploadResult;

use crate::clipboard::{Clipboard, ClipboardError};

/// `server.properties` lines that point a game server at the pack
pub fn server_properties(result: &UploadResult) -> String {
    format!(
        "resource-pack={}\nresource-pack-sha1={}",
        result.download_url, result.sha1
    )
}

/// Human-readable summary of an upload
pub fn summary(result: &UploadResult) -> String {
    format!(
        "Download link: {}\nSHA-1: {}\nDelete key: {}",
        result.download_url, result.sha1, result.delete_key
    )
}

/// A fragment of the result that can be copied on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CopyTarget {
    /// The download URL alone
    #[value(name = "url")]
    DownloadUrl,
    /// The SHA-1 alone
    Sha1,
    /// The full `server.properties` snippet
    Snippet,
}

impl CopyTarget {
    pub fn payload(self, result: &UploadResult) -> String {
        match self {
            CopyTarget::DownloadUrl => result.download_url.clone(),
            CopyTarget::Sha1 => result.sha1.clone(),
            CopyTarget::Snippet => server_properties(result),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CopyTarget::DownloadUrl => "download link",
            CopyTarget::Sha1 => "SHA-1",
            CopyTarget::Snippet => "server.properties snippet",
        }
    }
}

/// Put one fragment of `result` on `clipboard`
pub fn copy_to(
    clipboard: &mut dyn Clipboard,
    result: &UploadResult,
    target: CopyTarget,
) -> Result<(), ClipboardError> {
    clipboard.set_text(&target.payload(result))
}
