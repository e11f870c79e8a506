//! Output formatting helpers for CLI commands

use crate::advisory::{AdvisoryMessage, Severity};
use crate::history::{HistoryEntry, Outcome};
use crate::render::MetricsPanel;
use crate::session::{SessionMachine, SessionState};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for one finished session
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub file: String,
    pub outcome: Outcome,
    pub error: Option<String>,
    pub snapshots: u64,
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub last_frame: Option<u64>,
    pub advisory: Option<AdvisoryMessage>,
}

impl SessionSummary {
    pub fn new(file: impl Into<String>, outcome: Outcome, machine: &SessionMachine) -> Self {
        let view = machine.view();
        Self {
            file: file.into(),
            outcome,
            error: view.error.as_ref().map(|e| e.user_message()),
            snapshots: view.snapshots,
            frames_presented: view.frames_presented,
            frames_skipped: view.frames_skipped,
            last_frame: view.panel.frame_num(),
            advisory: view.advisory.clone(),
        }
    }
}

/// Status line for a state change, colored by lifecycle phase
pub fn format_status(state: SessionState, status: &str) -> String {
    let label = match state {
        SessionState::Idle => "idle".normal(),
        SessionState::Uploading | SessionState::Connecting => state.as_str().cyan(),
        SessionState::Streaming => "streaming".blue(),
        SessionState::Closed => "closed".green(),
        SessionState::UploadFailed | SessionState::Error => state.as_str().red(),
    };
    if status.is_empty() {
        format!("[{}]", label)
    } else {
        format!("[{}] {}", label, status)
    }
}

/// Advisory line, colored by severity
pub fn format_advisory(advisory: &AdvisoryMessage) -> String {
    match advisory.severity {
        Severity::Info => advisory.text.normal().to_string(),
        Severity::Warning => advisory.text.yellow().to_string(),
        Severity::Good => advisory.text.green().to_string(),
    }
}

/// Format the metrics panel as a table
pub fn format_panel_table(panel: &MetricsPanel) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let frame = panel
        .frame_num()
        .map(|n| n.to_string())
        .unwrap_or_else(|| crate::render::PLACEHOLDER.to_string());
    table.set_header(vec!["Metric".to_string(), format!("Frame {}", frame)]);

    for (name, value) in panel.entries() {
        table.add_row(vec![Cell::new(name.label()), Cell::new(value)]);
    }

    table.to_string()
}

/// Format recent session history as a table
pub fn format_history_table(entries: &[HistoryEntry]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Video", "Status"]);

    for entry in entries {
        let outcome = match entry.outcome {
            Outcome::Completed => "completed".green().to_string(),
            Outcome::Failed => "failed".red().to_string(),
            Outcome::UploadFailed => "upload_failed".red().to_string(),
        };
        table.add_row(vec![
            Cell::new(entry.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S")),
            Cell::new(&entry.filename),
            Cell::new(outcome),
        ]);
    }

    table.to_string()
}

/// Format session summaries and history as JSON
pub fn format_summary_json(
    sessions: &[SessionSummary],
    history: &[HistoryEntry],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "sessions": sessions,
        "history": history,
    }))
}
