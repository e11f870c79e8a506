//! Frame decoding configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wire encoding of the image field inside text records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedEncoding {
    /// Base64 of the encoded image bytes
    #[default]
    Base64,
    /// One character per raw byte (code points 0..=255)
    Latin1,
}

impl FromStr for EmbeddedEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base64" => Ok(EmbeddedEncoding::Base64),
            "latin1" => Ok(EmbeddedEncoding::Latin1),
            _ => Err(format!("Invalid embedded encoding: {}", s)),
        }
    }
}

/// Frame decoding configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub embedded_encoding: EmbeddedEncoding,
}
