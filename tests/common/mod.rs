//! Shared test utilities for Pitchlens integration tests.
//!
//! Provides a scripted in-memory transport and image helpers so session
//! tests run without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use pitchlens::frame::InboundMessage;
use pitchlens::transport::{InboundStream, Transport, TransportError, UploadFile, UploadReceipt};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Image Builders
// =============================================================================

/// Encode a solid-color PNG of the given size.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Base64 of a solid-color PNG, as sent in a text record's `frame_data`.
pub fn png_base64(width: u32, height: u32, color: [u8; 4]) -> String {
    use base64::{engine::general_purpose, Engine as _};
    general_purpose::STANDARD.encode(png_bytes(width, height, color))
}

/// A selectable upload file; the path is never read by the scripted transport.
pub fn upload_file(name: &str) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        path: format!("/videos/{}", name).into(),
    }
}

// =============================================================================
// Scripted Transport
// =============================================================================

/// One step of a scripted analysis stream.
#[derive(Debug, Clone)]
pub enum Step {
    Message(InboundMessage),
    Fail(TransportError),
    Delay(Duration),
    /// Never yield again; only a close ends the stream
    Hang,
}

pub fn binary(bytes: Vec<u8>) -> Step {
    Step::Message(InboundMessage::BinaryFrame(bytes))
}

pub fn text(json: serde_json::Value) -> Step {
    Step::Message(InboundMessage::TextPayload(json.to_string()))
}

/// Counters observable after the transport was moved into a session.
#[derive(Debug, Default)]
pub struct Calls {
    pub uploads: AtomicUsize,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Calls {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// In-memory [`Transport`] replaying a fixed script.
pub struct ScriptedTransport {
    upload: Result<UploadReceipt, TransportError>,
    open: Result<(), TransportError>,
    script: Mutex<Option<Vec<Step>>>,
    pub handles: Mutex<Vec<String>>,
    pub calls: Arc<Calls>,
}

impl ScriptedTransport {
    /// Upload succeeds under `filename` and the stream replays `script`.
    pub fn new(filename: &str, script: Vec<Step>) -> Self {
        Self {
            upload: Ok(UploadReceipt {
                filename: filename.to_string(),
            }),
            open: Ok(()),
            script: Mutex::new(Some(script)),
            handles: Mutex::new(Vec::new()),
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn rejecting_upload(error: TransportError) -> Self {
        Self {
            upload: Err(error),
            ..Self::new("unused", Vec::new())
        }
    }

    pub fn refusing_stream(filename: &str, error: TransportError) -> Self {
        Self {
            open: Err(error),
            ..Self::new(filename, Vec::new())
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn upload(&self, _file: &UploadFile) -> Result<UploadReceipt, TransportError> {
        self.calls.uploads.fetch_add(1, Ordering::SeqCst);
        self.upload.clone()
    }

    async fn open_stream(&self, handle: &str) -> Result<Box<dyn InboundStream>, TransportError> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        self.handles.lock().unwrap().push(handle.to_string());
        self.open.clone()?;
        let script = self.script.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(ScriptedStream {
            steps: script.into(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct ScriptedStream {
    steps: VecDeque<Step>,
    calls: Arc<Calls>,
}

#[async_trait]
impl InboundStream for ScriptedStream {
    async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        loop {
            match self.steps.pop_front()? {
                Step::Message(message) => return Some(Ok(message)),
                Step::Fail(error) => return Some(Err(error)),
                Step::Delay(duration) => tokio::time::sleep(duration).await,
                Step::Hang => {
                    self.steps.push_front(Step::Hang);
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        self.steps.clear();
        Ok(())
    }
}
