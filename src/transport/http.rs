//! HTTP upload + WebSocket stream transport.
//!
//! Uploads go to `{base_url}{upload_path}` as a multipart body with a single
//! `file` field. The analysis stream is opened at
//! `{ws base_url}{stream_path}/{filename}`.

use super::{InboundStream, Transport, TransportError, UploadFile, UploadReceipt};
use crate::config::ServerConfig;
use crate::frame::InboundMessage;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

/// Transport speaking to the analysis service over HTTP and WebSocket.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    upload_path: String,
    stream_path: String,
    request_timeout: Duration,
    connect_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with its own HTTP client.
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(config, client)
    }

    /// Create a transport with a custom HTTP client (for testing).
    pub fn with_client(config: &ServerConfig, client: Client) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        Ok(Self {
            client,
            base_url,
            upload_path: config.upload_path.clone(),
            stream_path: config.stream_path.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
        })
    }

    pub fn upload_url(&self) -> Result<Url, TransportError> {
        append_path(&self.base_url, &self.upload_path)
    }

    /// Stream URL for an uploaded file; the handle is percent-encoded as a
    /// single path segment.
    pub fn stream_url(&self, handle: &str) -> Result<Url, TransportError> {
        let mut url = append_path(&self.base_url, &self.stream_path)?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidUrl(format!("cannot switch {} to {}", url, scheme)))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl("stream URL cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(handle);
        Ok(url)
    }
}

fn append_path(base: &Url, path: &str) -> Result<Url, TransportError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(format!("{} cannot be a base URL", base)))?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        if path.ends_with('/') {
            segments.push("");
        }
    }
    Ok(url)
}

/// Extract the service's own explanation from an upload error body.
fn rejection_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => return Some(detail.clone()),
        Some(detail) if !detail.is_null() => return Some(detail.to_string()),
        _ => {}
    }
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, TransportError> {
        let url = self.upload_url()?;

        let handle = tokio::fs::File::open(&file.path)
            .await
            .map_err(|e| TransportError::File(format!("{}: {}", file.path.display(), e)))?;
        let length = handle
            .metadata()
            .await
            .map_err(|e| TransportError::File(format!("{}: {}", file.path.display(), e)))?
            .len();
        let mime = mime_guess::from_path(&file.path).first_or_octet_stream();
        let part = Part::stream_with_length(handle, length)
            .file_name(file.name.clone())
            .mime_str(mime.as_ref())
            .map_err(|e| TransportError::File(format!("invalid content type {}: {}", mime, e)))?;
        let form = Form::new().part("file", part);

        tracing::debug!(url = %url, file = %file.name, bytes = length, "Uploading video");

        let timeout_ms = self.request_timeout.as_millis() as u64;
        let response = self
            .client
            .post(url)
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(timeout_ms)
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            let message = rejection_message(&body)
                .unwrap_or_else(|| format!("video upload failed (HTTP {})", status.as_u16()));
            return Err(TransportError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse upload response: {}", e))
        })
    }

    async fn open_stream(&self, handle: &str) -> Result<Box<dyn InboundStream>, TransportError> {
        let url = self.stream_url(handle)?;
        tracing::debug!(url = %url, "Opening analysis stream");

        let (socket, _response) = tokio::time::timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.connect_timeout.as_millis() as u64))?
        .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Box::new(WsInboundStream::new(socket)))
    }
}

/// [`InboundStream`] over a WebSocket connection.
///
/// Ping/pong is answered by tungstenite itself; binary frames become
/// [`InboundMessage::BinaryFrame`], text frames [`InboundMessage::TextPayload`].
pub struct WsInboundStream<S> {
    socket: WebSocketStream<S>,
    closed: bool,
}

impl<S> WsInboundStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(socket: WebSocketStream<S>) -> Self {
        Self {
            socket,
            closed: false,
        }
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        match self.socket.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::Stream(e.to_string())),
        }
    }
}

#[async_trait]
impl<S> InboundStream for WsInboundStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn next_message(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        if self.closed {
            return None;
        }
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(InboundMessage::BinaryFrame(bytes.to_vec())))
                }
                Ok(Message::Text(text)) => {
                    return Some(Ok(InboundMessage::TextPayload(text.as_str().to_owned())))
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Peer closed analysis stream");
                    // Completes the closing handshake
                    if let Err(e) = self.shutdown().await {
                        tracing::debug!(error = %e, "Close handshake did not complete");
                    }
                    return None;
                }
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    self.closed = true;
                    return None;
                }
                Err(e) => return Some(Err(TransportError::Stream(e.to_string()))),
            }
        }
        self.closed = true;
        None
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.shutdown().await
    }
}
