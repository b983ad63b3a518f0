//! Clipboard access.
//!
//! `SystemClipboard` opens the OS clipboard lazily on first read and keeps the
//! handle, so it must be created and used on the dispatcher thread.

use std::fmt;

use log::debug;

pub trait ClipboardSource {
    /// Current clipboard text. `ClipboardError::Unavailable` when the clipboard
    /// is empty or holds something other than text.
    fn read_text(&mut self) -> Result<String, ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No text on the clipboard. Not a failure; the gesture is ignored.
    Unavailable,
    /// The clipboard couldn't be opened or read.
    Access(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable => write!(f, "clipboard holds no text"),
            ClipboardError::Access(msg) => write!(f, "clipboard access failed: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let mut clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => {
                let opened = arboard::Clipboard::new()
                    .map_err(|e| ClipboardError::Access(e.to_string()))?;
                debug!("System clipboard opened");
                opened
            }
        };
        let text = clipboard.get_text();
        self.clipboard = Some(clipboard);
        text.map_err(|e| match e {
            arboard::Error::ContentNotAvailable => ClipboardError::Unavailable,
            other => ClipboardError::Access(other.to_string()),
        })
    }
}
