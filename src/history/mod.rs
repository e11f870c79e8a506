//! Recent session history.
//!
//! Keeps the outcomes of the last five sessions, newest first. Nothing is
//! persisted across process restarts.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of entries the log retains
pub const HISTORY_CAPACITY: usize = 5;

/// Terminal outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Failed,
    UploadFailed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Completed => "completed",
            Outcome::Failed => "failed",
            Outcome::UploadFailed => "upload_failed",
        };
        f.write_str(s)
    }
}

/// One recorded session outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(filename: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            filename: filename.into(),
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// `HH:MM:SS - video: clip.mp4 - status: completed`, in local time
    pub fn display_line(&self) -> String {
        format!(
            "{} - video: {} - status: {}",
            self.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            self.filename,
            self.outcome
        )
    }
}

/// Bounded, most-recent-first log of session outcomes.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Record an entry at the front, evicting the oldest beyond capacity.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Entries, newest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Most recently recorded entry
    pub fn newest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}
