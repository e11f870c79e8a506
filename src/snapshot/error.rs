//! Metric record parsing errors

use thiserror::Error;

/// Errors raised while parsing a structured stream record.
///
/// Any of these means the stream is out of sync with the analysis service and
/// ends the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Text was not a JSON object of the expected shape
    #[error("malformed stream record: {0}")]
    Malformed(String),

    /// A required field was absent
    #[error("stream record missing required field '{0}'")]
    MissingField(&'static str),
}
