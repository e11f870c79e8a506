//! Error types for transport operations.

use thiserror::Error;

/// Errors that can occur while uploading or streaming.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Service rejected the upload; `message` is its own explanation.
    #[error("Upload rejected ({status}): {message}")]
    UploadRejected { status: u16, message: String },

    /// Service response doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Local file could not be read.
    #[error("Cannot read upload file: {0}")]
    File(String),

    /// Stream connection could not be established.
    #[error("Stream connection failed: {0}")]
    Connect(String),

    /// Open stream failed mid-flight (drop, protocol violation).
    #[error("Stream error: {0}")]
    Stream(String),
}

impl TransportError {
    /// Text to show the user. Service-provided rejection messages are passed
    /// through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::UploadRejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
