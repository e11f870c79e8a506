//! Session state machine.
//!
//! [`SessionMachine`] owns everything one upload-to-close cycle touches: the
//! lifecycle state, the render surface, the metrics panel, the advisory and the
//! history log. It performs no I/O. Each transition handler returns the
//! [`Effect`]s the caller must carry out, and [`driver::run_session`] is the
//! caller that does so against a [`Transport`](crate::transport::Transport).
//!
//! Only one session is ever active: `start` is refused while one is in flight.

pub mod driver;
mod error;
mod state;


pub use driver::{run_session, NoopObserver, SessionObserver};
pub use error::SessionError;
pub use state::SessionState;

use crate::advisory::{AdvisoryEvaluator, AdvisoryMessage, ThresholdRules};
use crate::config::PitchlensConfig;
use crate::frame::{DecodeError, DecodedFrame, FrameDecoder, FramePayload, InboundMessage};
use crate::history::{HistoryEntry, HistoryLog};
use crate::render::{MetricsPanel, PresentOutcome, RenderSurface};
use crate::snapshot::{self, StreamRecord};
use crate::transport::{TransportError, UploadFile, UploadReceipt};
use chrono::{DateTime, Utc};

/// One upload-to-close cycle.
#[derive(Debug, Clone)]
pub struct Session {
    /// Filename of the upload; replaced by the service's name once the upload succeeds
    pub id: String,
    /// Distinguishes this session's decode jobs from earlier sessions'
    pub generation: u64,
    pub started_at: DateTime<Utc>,
}

/// A frame decode requested by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeJob {
    pub generation: u64,
    /// Arrival sequence number of the message that carried the frame
    pub seq: u64,
    pub payload: FramePayload,
}

/// Side effect the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload(UploadFile),
    OpenStream { handle: String },
    Decode(DecodeJob),
    /// Close the open stream; emitted at most once per session
    CloseStream,
}

/// UI-facing state of the current (or last) session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub status: String,
    pub error: Option<SessionError>,
    pub panel: MetricsPanel,
    pub advisory: Option<AdvisoryMessage>,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    /// Snapshots applied to the panel this session
    pub snapshots: u64,
    /// Frames painted on the surface this session
    pub frames_presented: u64,
    /// Frames dropped because they failed to decode
    pub frames_skipped: u64,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            status: String::new(),
            error: None,
            panel: MetricsPanel::new(),
            advisory: None,
            start_enabled: true,
            stop_enabled: false,
            snapshots: 0,
            frames_presented: 0,
            frames_skipped: 0,
        }
    }
}

/// The session state machine.
pub struct SessionMachine {
    state: SessionState,
    session: Option<Session>,
    generation: u64,
    next_seq: u64,
    stream_open: bool,
    view: SessionView,
    surface: RenderSurface,
    history: HistoryLog,
    evaluator: Box<dyn AdvisoryEvaluator>,
    decoder: FrameDecoder,
}

impl SessionMachine {
    pub fn new(
        surface: RenderSurface,
        evaluator: Box<dyn AdvisoryEvaluator>,
        decoder: FrameDecoder,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            session: None,
            generation: 0,
            next_seq: 0,
            stream_open: false,
            view: SessionView::default(),
            surface,
            history: HistoryLog::new(),
            evaluator,
            decoder,
        }
    }

    /// Build a machine with the threshold rules and surface from configuration.
    pub fn from_config(config: &PitchlensConfig) -> Self {
        Self::new(
            RenderSurface::new(&config.render),
            Box::new(ThresholdRules::new(&config.advisory)),
            FrameDecoder::new(config.decode.embedded_encoding),
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn decoder(&self) -> FrameDecoder {
        self.decoder
    }

    /// Whether a stream is open and not yet asked to close
    pub fn stream_open(&self) -> bool {
        self.stream_open
    }

    /// `idle --start(file)--> uploading`.
    ///
    /// A missing file leaves the state untouched and sets the validation
    /// message. Starting from a terminal state resets first. Starting while a
    /// session is active is ignored; the start control is disabled then.
    pub fn start(&mut self, file: Option<UploadFile>) -> Result<Vec<Effect>, SessionError> {
        if self.state.is_active() {
            tracing::warn!(state = %self.state, "Start ignored while a session is active");
            return Ok(Vec::new());
        }
        let Some(file) = file else {
            self.view.error = Some(SessionError::Validation);
            return Err(SessionError::Validation);
        };
        if self.state.is_terminal() {
            self.reset();
        }

        self.generation += 1;
        self.next_seq = 0;
        self.stream_open = false;
        self.session = Some(Session {
            id: file.name.clone(),
            generation: self.generation,
            started_at: Utc::now(),
        });
        self.surface.reset();
        self.view = SessionView {
            status: "Uploading video...".to_string(),
            advisory: Some(AdvisoryMessage::pending()),
            start_enabled: false,
            ..SessionView::default()
        };
        self.transition(SessionState::Uploading);
        Ok(vec![Effect::Upload(file)])
    }

    /// `uploading --upload_ok(handle)--> connecting`
    pub fn on_upload_ok(&mut self, receipt: UploadReceipt) -> Vec<Effect> {
        if self.state != SessionState::Uploading {
            tracing::debug!(state = %self.state, "Ignoring stale upload result");
            return Vec::new();
        }
        if let Some(session) = self.session.as_mut() {
            session.id = receipt.filename.clone();
        }
        self.view.status = format!(
            "Upload succeeded: {}, starting analysis...",
            receipt.filename
        );
        self.transition(SessionState::Connecting);
        vec![Effect::OpenStream {
            handle: receipt.filename,
        }]
    }

    /// `uploading --upload_fail(reason)--> upload_failed`
    pub fn on_upload_failed(&mut self, error: TransportError) -> Vec<Effect> {
        if self.state != SessionState::Uploading {
            tracing::debug!(state = %self.state, "Ignoring stale upload failure");
            return Vec::new();
        }
        tracing::warn!(error = %error, "Upload failed");
        self.view.error = Some(SessionError::Upload(error.user_message()));
        self.view.status.clear();
        self.finish(SessionState::UploadFailed);
        Vec::new()
    }

    /// `connecting --stream_opened--> streaming`; enables the stop control.
    ///
    /// A stream that opens after the session already ended is closed again.
    pub fn on_stream_opened(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Connecting {
            tracing::debug!(state = %self.state, "Closing stream opened after session ended");
            return vec![Effect::CloseStream];
        }
        self.stream_open = true;
        self.view.status = "Connected, receiving analysis data...".to_string();
        self.view.stop_enabled = true;
        self.transition(SessionState::Streaming);
        Vec::new()
    }

    /// `streaming --message--> streaming`, or `error` if the message is fatal.
    pub fn on_message(&mut self, message: InboundMessage) -> Vec<Effect> {
        if self.state != SessionState::Streaming {
            tracing::debug!(state = %self.state, "Dropping message outside streaming state");
            return Vec::new();
        }
        let seq = self.next_seq;
        self.next_seq += 1;

        match message {
            InboundMessage::BinaryFrame(bytes) => {
                tracing::trace!(seq, bytes = bytes.len(), "Binary frame received");
                vec![self.decode_job(seq, FramePayload::Binary(bytes))]
            }
            InboundMessage::TextPayload(text) => match snapshot::parse(&text) {
                Err(e) => {
                    tracing::error!(seq, error = %e, "Unparseable stream record");
                    self.fail(SessionError::Parse(e))
                }
                Ok(StreamRecord::Failure(message)) => {
                    tracing::error!(seq, error = %message, "Analysis service reported an error");
                    self.fail(SessionError::Application(message))
                }
                Ok(StreamRecord::Frame { snapshot, image }) => {
                    tracing::trace!(
                        seq,
                        frame_num = snapshot.frame_num,
                        metrics = snapshot.defined_count(),
                        "Metric snapshot received"
                    );
                    self.view.panel.apply(&snapshot);
                    self.view.advisory = Some(self.evaluator.evaluate(&snapshot));
                    self.view.snapshots += 1;
                    image
                        .map(|image| self.decode_job(seq, FramePayload::Embedded(image)))
                        .into_iter()
                        .collect()
                }
            },
        }
    }

    /// Apply a finished decode.
    ///
    /// Completions from another session, or arriving after this one left the
    /// streaming state, are suppressed. Returns the presentation outcome when
    /// the frame reached the surface.
    pub fn on_decode_complete(
        &mut self,
        generation: u64,
        seq: u64,
        result: Result<DecodedFrame, DecodeError>,
    ) -> Option<PresentOutcome> {
        if self.state != SessionState::Streaming || generation != self.generation {
            tracing::debug!(seq, generation, state = %self.state, "Suppressing late decode");
            return None;
        }
        match result {
            Ok(frame) => {
                let outcome = self.surface.present(seq, &frame);
                match outcome {
                    PresentOutcome::Presented(_) => self.view.frames_presented += 1,
                    PresentOutcome::Superseded { presented } => {
                        tracing::debug!(seq, presented, "Decode superseded by newer frame")
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Skipping frame that failed to decode");
                self.view.frames_skipped += 1;
                None
            }
        }
    }

    /// `streaming --stream_closed_by_peer--> closed`
    pub fn on_stream_closed(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Streaming {
            return Vec::new();
        }
        self.stream_open = false;
        self.view.status = "Analysis finished or connection closed.".to_string();
        self.finish(SessionState::Closed);
        Vec::new()
    }

    /// `connecting | streaming --transport_error--> error`
    pub fn on_transport_error(&mut self, error: TransportError) -> Vec<Effect> {
        if !matches!(self.state, SessionState::Connecting | SessionState::Streaming) {
            tracing::debug!(state = %self.state, error = %error, "Ignoring transport error");
            return Vec::new();
        }
        tracing::error!(error = %error, "Analysis stream failed");
        self.fail(SessionError::Transport(error.to_string()))
    }

    /// User pressed stop.
    ///
    /// An active session ends as `closed` (cancellation is not a failure); a
    /// terminal session is reset to idle; idle is unaffected.
    pub fn user_stop(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Idle => Vec::new(),
            state if state.is_terminal() => {
                self.reset();
                Vec::new()
            }
            _ => {
                tracing::info!(state = %self.state, "Session stopped by user");
                let effects = self.close_stream();
                self.view.status = "Analysis stopped by user.".to_string();
                self.finish(SessionState::Closed);
                effects
            }
        }
    }

    /// Any terminal state `--reset--> idle`.
    pub fn reset(&mut self) {
        if !self.state.is_terminal() {
            return;
        }
        self.view.start_enabled = true;
        self.view.stop_enabled = false;
        self.transition(SessionState::Idle);
    }

    fn decode_job(&self, seq: u64, payload: FramePayload) -> Effect {
        Effect::Decode(DecodeJob {
            generation: self.generation,
            seq,
            payload,
        })
    }

    fn fail(&mut self, error: SessionError) -> Vec<Effect> {
        let effects = self.close_stream();
        self.view.error = Some(error);
        self.view.status.clear();
        self.finish(SessionState::Error);
        effects
    }

    fn close_stream(&mut self) -> Vec<Effect> {
        if std::mem::take(&mut self.stream_open) {
            vec![Effect::CloseStream]
        } else {
            Vec::new()
        }
    }

    /// Enter a terminal state and record its outcome exactly once.
    fn finish(&mut self, terminal: SessionState) {
        self.transition(terminal);
        self.view.start_enabled = true;
        self.view.stop_enabled = false;
        if let (Some(outcome), Some(session)) = (terminal.outcome(), self.session.as_ref()) {
            tracing::info!(session = %session.id, outcome = %outcome, "Session finished");
            self.history
                .record(HistoryEntry::new(session.id.clone(), outcome));
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "Session transition");
        self.state = next;
    }
}
