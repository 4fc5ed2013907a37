//! File acceptance at the selection boundary.
//!
//! Only single ZIP archives under the configured size limit become a
//! [`SelectedFile`]. Everything else is turned away here and never reaches
//! the upload workflow.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::{UploaderConfig, DEFAULT_MAX_PACK_SIZE};

/// MIME type of an accepted archive
pub const ZIP_MIME: &str = "application/zip";

/// Why a candidate file was turned away
#[derive(Debug, Error)]
pub enum SelectionRejected {
    #[error("{name} is not a ZIP archive")]
    NotZip { name: String, mime: Option<String> },

    #[error("{name} is {size} bytes, over the {max} byte limit")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("only one file can be uploaded at a time, got {0}")]
    TooManyFiles(usize),

    #[error("no file was offered")]
    NoFile,

    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An archive that passed the acceptance filter.
///
/// Only [`AcceptanceFilter`] hands these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    content: Bytes,
}

impl SelectedFile {
    /// File name as offered by the user
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Archive bytes. Cloning is cheap.
    pub fn content(&self) -> Bytes {
        self.content.clone()
    }
}

/// Zip-only, size-capped, single-file selection filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceFilter {
    max_size: u64,
}

impl Default for AcceptanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACK_SIZE)
    }
}

impl AcceptanceFilter {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(config.max_pack_size)
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Whether a name/MIME pair denotes a ZIP archive.
    ///
    /// Either signal is enough: a `application/zip` MIME type or a `.zip`
    /// extension in any case.
    pub fn is_zip(name: &str, mime: Option<&str>) -> bool {
        let by_mime = mime.is_some_and(|m| m.eq_ignore_ascii_case(ZIP_MIME));
        let by_extension = Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        by_mime || by_extension
    }

    /// Check a candidate without touching its content
    pub fn check(&self, name: &str, mime: Option<&str>, size: u64) -> Result<(), SelectionRejected> {
        if !Self::is_zip(name, mime) {
            return Err(SelectionRejected::NotZip {
                name: name.to_string(),
                mime: mime.map(str::to_string),
            });
        }
        if size > self.max_size {
            return Err(SelectionRejected::TooLarge {
                name: name.to_string(),
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Accept an in-memory candidate
    pub fn accept(
        &self,
        name: impl Into<String>,
        mime: Option<&str>,
        content: Bytes,
    ) -> Result<SelectedFile, SelectionRejected> {
        let name = name.into();
        self.check(&name, mime, content.len() as u64)?;
        debug!(name = %name, size = content.len(), "File accepted");
        Ok(SelectedFile { name, content })
    }

    /// Accept a file on disk.
    ///
    /// The size limit is checked against the file metadata before any
    /// content is read.
    pub async fn accept_path(&self, path: impl AsRef<Path>) -> Result<SelectedFile, SelectionRejected> {
        let path = path.as_ref();
        let io_error = |source| SelectionRejected::Io {
            path: path.to_path_buf(),
            source,
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_guess::from_path(path).first_raw();

        let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
        if !metadata.is_file() {
            return Err(io_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        self.check(&name, mime, metadata.len())?;

        let content = tokio::fs::read(path).await.map_err(io_error)?;
        self.accept(name, mime, Bytes::from(content))
    }

    /// Accept exactly one file out of a drop.
    ///
    /// A drop of several files is rejected as a whole.
    pub async fn accept_single<P: AsRef<Path>>(&self, paths: &[P]) -> Result<SelectedFile, SelectionRejected> {
        match paths {
            [] => Err(SelectionRejected::NoFile),
            [path] => self.accept_path(path).await,
            many => Err(SelectionRejected::TooManyFiles(many.len())),
        }
    }
}
