//! Async driver for [`SessionMachine`].
//!
//! Executes the machine's effects against a [`Transport`] and feeds the
//! results back in. Everything runs on the caller's task except frame
//! decoding, which goes to the blocking pool; decode results re-enter the
//! machine through the same loop as stream messages, so the surface and the
//! panel are only ever mutated from one place.

use super::{DecodeJob, Effect, SessionError, SessionMachine, SessionState, SessionView};
use crate::frame::{DecodeError, DecodedFrame, InboundMessage};
use crate::history::Outcome;
use crate::logging::{generate_trace_id, session_span};
use crate::render::{PresentOutcome, RenderSurface};
use crate::transport::{InboundStream, Transport, TransportError, UploadFile};
use std::collections::VecDeque;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Receives UI updates while a session runs. All methods default to no-ops.
pub trait SessionObserver: Send {
    /// Lifecycle state changed; `view` carries the new status and error line
    fn state_changed(&mut self, _state: SessionState, _view: &SessionView) {}

    /// A snapshot was applied to the panel
    fn metrics_updated(&mut self, _view: &SessionView) {}

    /// A frame was painted on the surface
    fn frame_presented(&mut self, _seq: u64, _surface: &RenderSurface) {}
}

/// Observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

type DecodeResult = (u64, u64, Result<DecodedFrame, DecodeError>);

enum LoopEvent {
    Cancelled,
    Decoded(Result<DecodeResult, JoinError>),
    Message(Option<Result<InboundMessage, TransportError>>),
}

/// In-flight I/O owned by one run.
struct Runner<'a, T: ?Sized> {
    machine: &'a mut SessionMachine,
    transport: &'a T,
    cancel: &'a CancellationToken,
    observer: &'a mut dyn SessionObserver,
    stream: Option<Box<dyn InboundStream>>,
    decodes: JoinSet<DecodeResult>,
    effects: VecDeque<Effect>,
    last_state: SessionState,
    last_snapshots: u64,
}

/// Run one session to a terminal state.
///
/// Cancelling `cancel` is a user stop. Returns the recorded outcome; the
/// user-facing error, if any, stays on [`SessionMachine::view`]. A missing
/// file fails with [`SessionError::Validation`] before anything is sent.
pub async fn run_session<T>(
    machine: &mut SessionMachine,
    transport: &T,
    file: Option<UploadFile>,
    cancel: &CancellationToken,
    observer: &mut dyn SessionObserver,
) -> Result<Outcome, SessionError>
where
    T: Transport + ?Sized,
{
    let trace_id = generate_trace_id();
    let name = file.as_ref().map(|f| f.name.clone()).unwrap_or_default();
    let span = session_span(&trace_id, &name);

    async move {
        let before = machine.state();
        let effects = machine.start(file)?;
        let mut runner = Runner {
            last_state: before,
            last_snapshots: machine.view().snapshots,
            machine,
            transport,
            cancel,
            observer,
            stream: None,
            decodes: JoinSet::new(),
            effects: effects.into(),
        };
        runner.notify();
        runner.run().await;

        let outcome = runner.machine.state().outcome();
        Ok::<_, SessionError>(outcome.unwrap_or(Outcome::Completed))
    }
    .instrument(span)
    .await
}

impl<T> Runner<'_, T>
where
    T: Transport + ?Sized,
{
    async fn run(&mut self) {
        loop {
            while let Some(effect) = self.effects.pop_front() {
                self.execute(effect).await;
                self.notify();
            }
            // Upload and connect resolve inside `execute`; only a live stream waits here
            if self.machine.state() != SessionState::Streaming {
                break;
            }

            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => LoopEvent::Cancelled,
                Some(joined) = self.decodes.join_next(), if !self.decodes.is_empty() => {
                    LoopEvent::Decoded(joined)
                }
                message = next_message(&mut self.stream) => LoopEvent::Message(message),
            };

            match event {
                LoopEvent::Cancelled => {
                    let effects = self.machine.user_stop();
                    self.effects.extend(effects);
                }
                LoopEvent::Decoded(joined) => self.apply_decode(joined),
                LoopEvent::Message(Some(Ok(message))) => {
                    let effects = self.machine.on_message(message);
                    self.effects.extend(effects);
                }
                LoopEvent::Message(Some(Err(e))) => {
                    let effects = self.machine.on_transport_error(e);
                    self.effects.extend(effects);
                }
                LoopEvent::Message(None) => {
                    self.stream = None;
                    self.drain_decodes().await;
                    let effects = self.machine.on_stream_closed();
                    self.effects.extend(effects);
                }
            }
            self.notify();
        }

        let in_flight = self.decodes.len();
        if in_flight > 0 {
            tracing::debug!(in_flight, "Aborting outstanding decodes");
            self.decodes.abort_all();
        }
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close().await {
                tracing::debug!(error = %e, "Stream close failed");
            }
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Upload(file) => {
                tracing::info!(file = %file.name, "Uploading video");
                let result = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    result = self.transport.upload(&file) => Some(result),
                };
                let effects = match result {
                    None => self.machine.user_stop(),
                    Some(Ok(receipt)) => {
                        tracing::info!(handle = %receipt.filename, "Upload accepted");
                        self.machine.on_upload_ok(receipt)
                    }
                    Some(Err(e)) => self.machine.on_upload_failed(e),
                };
                self.effects.extend(effects);
            }
            Effect::OpenStream { handle } => {
                let result = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    result = self.transport.open_stream(&handle) => Some(result),
                };
                let effects = match result {
                    None => self.machine.user_stop(),
                    Some(Ok(stream)) => {
                        tracing::info!(handle = %handle, "Analysis stream open");
                        self.stream = Some(stream);
                        self.machine.on_stream_opened()
                    }
                    Some(Err(e)) => self.machine.on_transport_error(e),
                };
                self.effects.extend(effects);
            }
            Effect::Decode(DecodeJob {
                generation,
                seq,
                payload,
            }) => {
                let decoder = self.machine.decoder();
                self.decodes
                    .spawn_blocking(move || (generation, seq, decoder.decode(&payload)));
            }
            Effect::CloseStream => {
                if let Some(mut stream) = self.stream.take() {
                    tracing::debug!("Closing analysis stream");
                    if let Err(e) = stream.close().await {
                        tracing::warn!(error = %e, "Stream close failed");
                    }
                }
            }
        }
    }

    fn apply_decode(&mut self, joined: Result<DecodeResult, JoinError>) {
        let (generation, seq, result) = match joined {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(error = %e, "Decode task did not complete");
                return;
            }
        };
        if let Some(PresentOutcome::Presented(_)) =
            self.machine.on_decode_complete(generation, seq, result)
        {
            self.observer.frame_presented(seq, self.machine.surface());
        }
    }

    /// Apply decodes still in flight when the peer closed, unless stopped.
    async fn drain_decodes(&mut self) {
        while !self.decodes.is_empty() {
            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                joined = self.decodes.join_next() => joined,
            };
            match joined {
                Some(joined) => self.apply_decode(joined),
                None => return,
            }
        }
    }

    fn notify(&mut self) {
        let view = self.machine.view();
        if view.snapshots != self.last_snapshots {
            self.last_snapshots = view.snapshots;
            self.observer.metrics_updated(view);
        }
        let state = self.machine.state();
        if state != self.last_state {
            self.last_state = state;
            self.observer.state_changed(state, view);
        }
    }
}

async fn next_message(
    stream: &mut Option<Box<dyn InboundStream>>,
) -> Option<Result<InboundMessage, TransportError>> {
    match stream {
        Some(stream) => stream.next_message().await,
        None => std::future::pending().await,
    }
}
