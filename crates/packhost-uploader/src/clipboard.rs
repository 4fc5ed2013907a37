//! Clipboard capability supplied by the environment.

use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write clipboard: {0}")]
    Io(#[from] std::io::Error),
}

/// Somewhere copied text can go
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Writes copied text to stdout, one payload per line.
///
/// Used when no system clipboard is compiled in; pipe it to `pbcopy`,
/// `xclip` or similar.
#[derive(Debug, Default)]
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

/// The platform clipboard
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner = arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// Best clipboard available in this build
pub fn default_clipboard() -> Box<dyn Clipboard> {
    #[cfg(feature = "clipboard")]
    {
        match SystemClipboard::new() {
            Ok(clipboard) => return Box::new(clipboard),
            Err(e) => tracing::warn!(error = %e, "Falling back to stdout clipboard"),
        }
    }
    Box::new(StdoutClipboard)
}
