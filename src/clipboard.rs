//! System clipboard access for copying notes

use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write clipboard: {0}")]
    Write(String),
}

/// Write-only clipboard seam so the app actor can be tested without a display
pub trait Clipboard: Send {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// OS clipboard, opened on first use
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        if guard.is_none() {
            let cb = arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *guard = Some(cb);
        }
        match guard.as_mut() {
            Some(cb) => cb.set_text(text.to_owned()).map_err(|e| ClipboardError::Write(e.to_string())),
            None => Err(ClipboardError::Unavailable("not initialized".into())),
        }
    }
}
