//! Frame decoding error types

use thiserror::Error;

/// Errors that can occur while decoding a single frame.
///
/// A decode error never ends a session: the frame is skipped and the stream
/// continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload carried no bytes at all
    #[error("empty frame payload")]
    Empty,

    /// Embedded image field was not valid base64
    #[error("invalid base64 image data: {0}")]
    Base64(String),

    /// Latin-1 embedded image contained a character that is not a single byte
    #[error("embedded image contains non latin-1 character at offset {0}")]
    NonLatin1(usize),

    /// Bytes could not be decoded as a supported image format
    #[error("unsupported or malformed image: {0}")]
    Image(String),
}
