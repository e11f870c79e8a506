//! Transport adapter for the analysis service.
//!
//! The session state machine never touches the network directly. It talks to a
//! [`Transport`] that uploads a video and opens the duplex analysis stream,
//! yielding [`InboundMessage`]s through an [`InboundStream`].

pub mod error;
pub mod http;

pub use error::TransportError;
pub use http::HttpTransport;

use crate::frame::InboundMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A local video file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent in the multipart body
    pub name: String,
    pub path: PathBuf,
}

impl UploadFile {
    /// Select a file from disk. Returns `None` when the path is not a regular
    /// file, which the session treats as "no file selected".
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            name,
            path: path.to_path_buf(),
        })
    }
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Name the service stored the video under; keys the analysis stream
    pub filename: String,
}

/// Upload and stream-open operations against the analysis service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Upload a video and return the handle the service assigned to it.
    ///
    /// # Returns
    ///
    /// - `Ok(UploadReceipt)` on success
    /// - `Err(TransportError::UploadRejected)` if the service reported a failure
    /// - `Err(TransportError::Network | Timeout | File)` on local or connection failures
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, TransportError>;

    /// Open the analysis stream for an uploaded video.
    async fn open_stream(&self, handle: &str) -> Result<Box<dyn InboundStream>, TransportError>;
}

/// Receiving half of an open analysis stream.
///
/// `next_message` must be cancellation-safe: the session driver polls it
/// inside `tokio::select!`.
#[async_trait]
pub trait InboundStream: Send {
    /// Next message in arrival order; `None` once the peer has closed.
    async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>>;

    /// Close the stream. Calling this on a closed stream is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_file_from_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"video").unwrap();

        let file = UploadFile::from_path(&path).unwrap();
        assert_eq!(file.name, "clip.mp4");
        assert_eq!(file.path, path);
    }

    #[test]
    fn test_upload_file_missing_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UploadFile::from_path(dir.path()).is_none());
        assert!(UploadFile::from_path(dir.path().join("missing.mp4")).is_none());
    }
}
