// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Shared helpers for the integration tests: an in-process server on an
//! ephemeral port, a scriptable classifier, and tiny JPEG frames.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use signkit_inference::{ClassifierAdapter, SignClassifier};
use signkit_server::{create_app_with_state, AppState, Config};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Classifier whose top class can be flipped between frames. The selected
/// class gets probability 0.9; the rest share the remainder.
pub struct ScriptedClassifier {
    class_count: usize,
    top_class: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(class_count: usize) -> Self {
        Self { class_count, top_class: AtomicUsize::new(0) }
    }

    pub fn set_top_class(&self, class: usize) {
        self.top_class.store(class, Ordering::SeqCst);
    }
}

impl SignClassifier for ScriptedClassifier {
    fn class_count(&self) -> usize {
        self.class_count
    }

    fn predict(&self, _window: &[Vec<f32>]) -> signkit_inference::Result<Vec<f32>> {
        let top = self.top_class.load(Ordering::SeqCst);
        let rest = 0.1 / (self.class_count as f32 - 1.0);
        let mut probabilities = vec![rest; self.class_count];
        probabilities[top] = 0.9;
        Ok(probabilities)
    }
}

/// A config sized for fast tests: 3-frame window, 2-frame stability.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.detection.sequence_length = 3;
    config.detection.stability_window = 2;
    config
}

pub fn state_without_classifier(config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config, None, None))
}

pub fn state_with_classifier(
    config: Config,
    classifier: Arc<ScriptedClassifier>,
) -> Arc<AppState> {
    Arc::new(AppState::new(config, Some(ClassifierAdapter::new(classifier)), None))
}

/// Serves the app on an ephemeral local port.
pub async fn spawn_server(state: Arc<AppState>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app_with_state(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    (addr, handle)
}

pub async fn connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{addr}/ws/sign-detection");
    let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws
}

pub async fn connect_with_key(addr: SocketAddr, api_key: &str) -> WsClient {
    let url = format!("ws://{addr}/ws/sign-detection?api_key={api_key}");
    let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws
}

/// A valid base64 JPEG payload (decodes, extracts zero features without a
/// landmark model).
pub fn jpeg_frame() -> String {
    let pixel = image::Rgb([64u8, 128, 192]);
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, pixel));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Jpeg).unwrap();
    BASE64_STANDARD.encode(bytes.into_inner())
}

pub async fn send_text(ws: &mut WsClient, text: impl Into<String>) {
    let text: String = text.into();
    ws.send(Message::Text(text.into())).await.unwrap();
}

pub async fn send_frame(ws: &mut WsClient, payload: &str) {
    let message = serde_json::json!({ "type": "frame", "frame": payload });
    send_text(ws, message.to_string()).await;
}

/// Receives the next text message and parses it as JSON, failing the test
/// after a generous timeout.
pub async fn recv_json(ws: &mut WsClient) -> serde_json::Value {
    let deadline = std::time::Duration::from_secs(5);
    loop {
        let message = tokio::time::timeout(deadline, ws.next())
            .await
            .expect("timed out waiting for a response")
            .expect("connection closed unexpectedly")
            .unwrap();
        match message {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

/// Asserts that no response arrives within a short grace period.
pub async fn expect_silence(ws: &mut WsClient) {
    let grace = std::time::Duration::from_millis(200);
    let result = tokio::time::timeout(grace, ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}
