//! Integration tests for the HTTP upload and WebSocket stream transport.

mod common;

use async_trait::async_trait;
use common::{png_base64, png_bytes};
use futures::{SinkExt, StreamExt};
use pitchlens::config::{PitchlensConfig, ServerConfig};
use pitchlens::frame::InboundMessage;
use pitchlens::history::Outcome;
use pitchlens::session::{run_session, NoopObserver, SessionMachine};
use pitchlens::transport::{
    HttpTransport, InboundStream, Transport, TransportError, UploadFile, UploadReceipt,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(base_url: &str) -> HttpTransport {
    HttpTransport::new(&ServerConfig {
        base_url: base_url.to_string(),
        connect_timeout_seconds: 5,
        request_timeout_seconds: 5,
        ..Default::default()
    })
    .unwrap()
}

/// Write a small fake video to a temp dir and select it.
fn video_file(dir: &tempfile::TempDir, name: &str) -> UploadFile {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42 not really a video").unwrap();
    UploadFile::from_path(&path).unwrap()
}

/// Serve one WebSocket connection that sends `messages` and then closes.
async fn spawn_stream_server(messages: Vec<Message>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        for message in messages {
            ws.send(message).await.unwrap();
        }
        ws.close(None).await.ok();
        // Complete the closing handshake
        while let Some(Ok(_)) = ws.next().await {}
    });
    addr
}

#[tokio::test]
async fn test_upload_sends_multipart_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_video/"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"filename": "clip.mp4"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let receipt = assert_ok!(
        transport(&server.uri())
            .upload(&video_file(&dir, "clip.mp4"))
            .await
    );
    assert_eq!(receipt.filename, "clip.mp4");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains(r#"filename="clip.mp4""#));
    assert!(body.contains("ftypmp42"));
}

#[tokio::test]
async fn test_upload_rejection_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_video/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"detail": "Only mp4 files are accepted"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = transport(&server.uri())
        .upload(&video_file(&dir, "clip.avi"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::UploadRejected {
            status: 400,
            message: "Only mp4 files are accepted".to_string()
        }
    );
    assert_eq!(err.user_message(), "Only mp4 files are accepted");
}

#[tokio::test]
async fn test_upload_rejection_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_video/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = transport(&server.uri())
        .upload(&video_file(&dir, "clip.mp4"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::UploadRejected {
            status: 500,
            message: "video upload failed (HTTP 500)".to_string()
        }
    );
}

#[tokio::test]
async fn test_upload_invalid_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_video/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = assert_err!(
        transport(&server.uri())
            .upload(&video_file(&dir, "clip.mp4"))
            .await
    );
    assert!(matches!(err, TransportError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_upload_unreadable_file() {
    let file = UploadFile {
        name: "gone.mp4".to_string(),
        path: "/nonexistent/gone.mp4".into(),
    };
    let err = transport("http://127.0.0.1:9").upload(&file).await.unwrap_err();
    assert!(matches!(err, TransportError::File(_)));
}

#[tokio::test]
async fn test_stream_yields_binary_and_text_then_ends() {
    let png = png_bytes(16, 16, [255, 255, 255, 255]);
    let record = r#"{"frame_num": 1, "metrics": {"stride_angle": 18}}"#;
    let addr = spawn_stream_server(vec![
        Message::Binary(png.clone().into()),
        Message::Text(record.into()),
    ])
    .await;

    let t = transport(&format!("http://{}", addr));
    let mut stream = t.open_stream("clip.mp4").await.unwrap();

    assert_eq!(
        stream.next_message().await.unwrap().unwrap(),
        InboundMessage::BinaryFrame(png)
    );
    assert_eq!(
        stream.next_message().await.unwrap().unwrap(),
        InboundMessage::TextPayload(record.to_string())
    );
    assert!(stream.next_message().await.is_none());
    // Closing after the peer did is a no-op
    assert!(stream.close().await.is_ok());
    assert!(stream.next_message().await.is_none());
}

#[tokio::test]
async fn test_stream_connect_refused() {
    // Grab a free port, then release it so nothing listens there
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = transport(&format!("http://{}", addr))
        .open_stream("clip.mp4")
        .await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
}

/// Uploads to one server and streams from another.
struct SplitTransport {
    upload: HttpTransport,
    stream: HttpTransport,
}

#[async_trait]
impl Transport for SplitTransport {
    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt, TransportError> {
        self.upload.upload(file).await
    }

    async fn open_stream(&self, handle: &str) -> Result<Box<dyn InboundStream>, TransportError> {
        self.stream.open_stream(handle).await
    }
}

#[tokio::test]
async fn test_full_session_over_http_and_websocket() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_video/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"filename": "stored_clip.mp4"})),
        )
        .mount(&server)
        .await;

    let record = serde_json::json!({
        "frame_num": 5,
        "frame_data": png_base64(64, 48, [10, 200, 10, 255]),
        "metrics": {"stride_angle": 11.0, "throwing_angle": 100.0},
    });
    let addr = spawn_stream_server(vec![
        Message::Binary(png_bytes(64, 48, [200, 10, 10, 255]).into()),
        Message::Text(record.to_string().into()),
    ])
    .await;

    let split = SplitTransport {
        upload: transport(&server.uri()),
        stream: transport(&format!("http://{}", addr)),
    };
    let dir = tempfile::tempdir().unwrap();
    let mut machine = SessionMachine::from_config(&PitchlensConfig::default());

    let outcome = run_session(
        &mut machine,
        &split,
        Some(video_file(&dir, "clip.mp4")),
        &CancellationToken::new(),
        &mut NoopObserver,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(machine.surface().presented_seq(), Some(1));
    let view = machine.view();
    assert_eq!(view.panel.frame_num(), Some(5));
    assert_eq!(
        view.advisory.as_ref().unwrap().text,
        "Suggestion: stride angle is below 15°."
    );
    assert_eq!(machine.history().newest().unwrap().filename, "stored_clip.mp4");
}
