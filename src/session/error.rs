//! Session error taxonomy

use crate::snapshot::ParseError;
use thiserror::Error;

/// Errors surfaced to the user by the session state machine.
///
/// Frame decode failures are deliberately absent: they are recovered where
/// they happen and never reach the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No file was selected; nothing was sent
    #[error("Please select a video file first.")]
    Validation,

    /// Upload failed in transport or was rejected by the service
    #[error("Upload or analysis failed: {0}")]
    Upload(String),

    /// A text record could not be parsed; the stream is out of sync
    #[error("Malformed analysis data: {0}")]
    Parse(#[from] ParseError),

    /// The analysis service reported a failure
    #[error("Analysis error: {0}")]
    Application(String),

    /// The stream connection failed
    #[error("Connection error: {0}")]
    Transport(String),
}

impl SessionError {
    /// Message to show on the error line
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
