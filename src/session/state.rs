//! Session lifecycle states.

use crate::history::Outcome;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of the session machine.
///
/// ```text
/// idle -> uploading -> connecting -> streaming -> closed
///            |             |             |
///            v             v             v
///      upload_failed     error         error
/// ```
///
/// `closed`, `upload_failed` and `error` are terminal; `reset` returns to `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Uploading,
    Connecting,
    Streaming,
    Closed,
    UploadFailed,
    Error,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Closed | SessionState::UploadFailed | SessionState::Error
        )
    }

    /// A session is in flight (the start control is disabled)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Uploading | SessionState::Connecting | SessionState::Streaming
        )
    }

    /// History outcome recorded on entering this state
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            SessionState::Closed => Some(Outcome::Completed),
            SessionState::UploadFailed => Some(Outcome::UploadFailed),
            SessionState::Error => Some(Outcome::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploading => "uploading",
            SessionState::Connecting => "connecting",
            SessionState::Streaming => "streaming",
            SessionState::Closed => "closed",
            SessionState::UploadFailed => "upload_failed",
            SessionState::Error => "error",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
