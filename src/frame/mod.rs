//! Frame decoding for the analysis stream.
//!
//! The stream interleaves two kinds of messages: raw encoded-image bytes and
//! JSON records that may embed an image. Both are funnelled through
//! [`InboundMessage`] and decoded by [`FrameDecoder`] into a [`DecodedFrame`].

mod error;

pub use error::DecodeError;

use crate::config::EmbeddedEncoding;
use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;

/// A single message received from the analysis stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Raw encoded-image bytes, no envelope
    BinaryFrame(Vec<u8>),
    /// Structured JSON record
    TextPayload(String),
}

/// Image data extracted from an inbound message, ready to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    /// Encoded image bytes taken from a binary message
    Binary(Vec<u8>),
    /// Image field of a text record, still in its wire encoding
    Embedded(String),
}

impl FramePayload {
    /// Size of the payload in bytes as received.
    pub fn len(&self) -> usize {
        match self {
            FramePayload::Binary(bytes) => bytes.len(),
            FramePayload::Embedded(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded raster image with its natural dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub image: RgbaImage,
}

impl DecodedFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Natural width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Natural height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decodes frame payloads into raster images.
///
/// The encoding of the embedded image field is fixed by configuration and
/// applied to every text record; it is never sniffed per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    embedded: EmbeddedEncoding,
}

impl FrameDecoder {
    pub fn new(embedded: EmbeddedEncoding) -> Self {
        Self { embedded }
    }

    pub fn embedded_encoding(&self) -> EmbeddedEncoding {
        self.embedded
    }

    /// Decode a payload into a frame.
    ///
    /// # Example
    ///
    /// ```
    /// use pitchlens::frame::{DecodeError, FrameDecoder, FramePayload};
    ///
    /// let decoder = FrameDecoder::default();
    /// let result = decoder.decode(&FramePayload::Embedded("not base64!".into()));
    /// assert!(matches!(result, Err(DecodeError::Base64(_))));
    /// ```
    pub fn decode(&self, payload: &FramePayload) -> Result<DecodedFrame, DecodeError> {
        let bytes = match payload {
            FramePayload::Binary(bytes) => std::borrow::Cow::Borrowed(bytes.as_slice()),
            FramePayload::Embedded(text) => std::borrow::Cow::Owned(self.unwrap_embedded(text)?),
        };
        decode_image(&bytes)
    }

    fn unwrap_embedded(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        match self.embedded {
            EmbeddedEncoding::Base64 => decode_base64(text),
            EmbeddedEncoding::Latin1 => decode_latin1(text),
        }
    }
}

fn decode_image(bytes: &[u8]) -> Result<DecodedFrame, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let image = image::load_from_memory(bytes).map_err(|e| DecodeError::Image(e.to_string()))?;
    Ok(DecodedFrame::new(image.to_rgba8()))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    let text = text.trim();
    // Tolerate a data URL wrapper such as "data:image/jpeg;base64,..."
    let data = match text.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => text,
    };
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

fn decode_latin1(text: &str) -> Result<Vec<u8>, DecodeError> {
    text.chars()
        .enumerate()
        .map(|(offset, c)| u8::try_from(u32::from(c)).map_err(|_| DecodeError::NonLatin1(offset)))
        .collect()
}
