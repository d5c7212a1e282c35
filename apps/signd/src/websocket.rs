// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Per-connection WebSocket handler.
//!
//! Each connection runs this loop on its own task, strictly FIFO: frame
//! *n + 1* is never touched before frame *n* finished, so `frames_processed`
//! is monotonic and a `sentence_complete` always precedes the prediction of
//! the frame that triggered it. Per-frame failures follow the error
//! taxonomy: protocol mistakes get an error response, transport glitches
//! (bad base64, corrupt JPEG) are dropped silently so one client hiccup
//! does not flood the stream with noise.

use axum::extract::ws::{Message, WebSocket};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use signkit_api::{round_confidence, round_latency_ms, ClientMessage, ServerMessage};
use signkit_inference::top_prediction;

use crate::session::ConnectionSession;
use crate::state::AppState;

static ACTIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

/// Inference slower than this gets a warning for observability.
const SLOW_INFERENCE_WARN_MS: f64 = 200.0;

/// Helper function to send a JSON message over WebSocket with consistent
/// error handling. Returns `Err(())` if serialization or sending failed,
/// indicating the connection should be closed.
async fn send_json_message<T: Serialize + Sync>(
    socket: &mut WebSocket,
    message: &T,
    message_type: &str,
) -> Result<(), ()> {
    match serde_json::to_string(message) {
        Ok(json) => {
            if socket.send(Message::Text(json.into())).await.is_err() {
                warn!("Failed to send WebSocket {}", message_type);
                Err(())
            } else {
                Ok(())
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize {}", message_type);
            Err(())
        }
    }
}

/// Main WebSocket connection handler.
pub async fn handle_websocket(mut socket: WebSocket, app_state: Arc<AppState>) {
    let active = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    info!(active, "WebSocket connection established");

    let mut session = ConnectionSession::new(&app_state);

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(text)) => {
                if !handle_client_message(&mut socket, text.as_str(), &mut session, &app_state)
                    .await
                {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                // The protocol is JSON text; binary payloads get the same
                // response as unparseable text.
                if send_json_message(
                    &mut socket,
                    &ServerMessage::error("Invalid JSON"),
                    "error response",
                )
                .await
                .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket connection closed");
                break;
            }
            Ok(_) => {} // Ping/Pong are answered by the transport
            Err(e) => {
                debug!(error = %e, "WebSocket transport error");
                break;
            }
        }
    }

    // Dropping the session here releases the extractor and all per-connection
    // state; nothing is sent after this point.
    let prev = ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
    info!(active = prev.saturating_sub(1), "WebSocket connection terminated");
}

/// Handles one inbound text message. Returns false when the connection
/// should be torn down (send failure).
async fn handle_client_message(
    socket: &mut WebSocket,
    text: &str,
    session: &mut ConnectionSession,
    app_state: &AppState,
) -> bool {
    let responses = match ClientMessage::parse(text) {
        Ok(ClientMessage::Frame { frame }) => process_frame(session, app_state, frame).await,
        Err(parse_error) => vec![ServerMessage::error(parse_error.to_string())],
    };

    for response in &responses {
        if send_json_message(socket, response, "response").await.is_err() {
            return false;
        }
    }
    true
}

/// Runs one frame through the pipeline: decode, extract, buffer, classify,
/// stabilize, assemble. Returns the ordered responses for this frame —
/// possibly none (silent drop), and at most a `sentence_complete` followed
/// by the `sign_prediction` that triggered it.
async fn process_frame(
    session: &mut ConnectionSession,
    app_state: &AppState,
    frame: Option<String>,
) -> Vec<ServerMessage> {
    let Some(raw) = frame else {
        return Vec::new();
    };
    if raw.trim().is_empty() {
        return Vec::new();
    }

    // Tolerate a data-URL wrapper; a "data:" prefix without the comma
    // separator carries no payload and is skipped.
    let payload = if raw.starts_with("data:") {
        match raw.split_once(',') {
            Some((_, encoded)) => encoded,
            None => return Vec::new(),
        }
    } else {
        raw.as_str()
    };

    let max_payload = app_state.config.server.max_frame_payload;
    if raw.len() > max_payload {
        warn!(len = raw.len(), max = max_payload, "Dropping oversized frame payload");
        return Vec::new();
    }

    if !session.limiter.try_admit(Instant::now()) {
        return vec![ServerMessage::error(app_state.config.rate_limit.rejection_message())];
    }

    let Ok(jpeg) = BASE64_STANDARD.decode(payload) else {
        return Vec::new();
    };

    let frame = match session.extractor.extract(&jpeg) {
        Ok(Some(frame)) => frame,
        Ok(None) => return Vec::new(),
        Err(e) => {
            debug!(error = %e, "Landmark extraction failed, dropping frame");
            return Vec::new();
        }
    };

    let hands_detected = frame.hands_detected;
    session.window.push(frame.features);
    session.frames_processed += 1;

    if !session.window.is_full() {
        return vec![ServerMessage::Buffering {
            frames_collected: session.window.len(),
            frames_needed: session.window.capacity(),
            hands_detected,
        }];
    }

    let Some(classifier) = app_state.classifier.as_ref() else {
        return vec![ServerMessage::error("Model not loaded")];
    };

    let (probabilities, inference_ms) = match classifier.predict(session.window.snapshot()).await
    {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Classification failed");
            return vec![ServerMessage::error("Inference failed")];
        }
    };

    app_state.latency.record(inference_ms);
    if inference_ms > SLOW_INFERENCE_WARN_MS {
        warn!(inference_ms, "Slow inference");
    }

    let actions = &app_state.config.detection.actions;
    if probabilities.len() != actions.len() {
        warn!(
            probabilities = probabilities.len(),
            actions = actions.len(),
            "Classifier output does not match the configured action list"
        );
        return vec![ServerMessage::error("Inference failed")];
    }
    let Some((top_class, top_confidence)) = top_prediction(&probabilities) else {
        return vec![ServerMessage::error("Inference failed")];
    };
    // Length equality was checked above, so the label exists.
    let Some(sign) = actions.label(top_class) else {
        return vec![ServerMessage::error("Inference failed")];
    };
    let sign = sign.to_string();

    let update = session.stability.update(top_class, top_confidence);

    let mut responses = Vec::with_capacity(2);
    if update.is_new_sign {
        if let Some(sentence) = session.sentence.observe_new_sign(&sign, Instant::now()) {
            debug!(sentence = %sentence, "Sentence completed");
            responses.push(ServerMessage::SentenceComplete { sentence });
        }
    }

    let all_predictions = actions
        .iter()
        .zip(&probabilities)
        .map(|(label, p)| (label.to_string(), round_confidence(f64::from(*p))))
        .collect();

    responses.push(ServerMessage::SignPrediction {
        sign,
        confidence: round_confidence(f64::from(top_confidence)),
        is_stable: update.is_stable,
        is_new_sign: update.is_new_sign,
        hands_detected,
        all_predictions,
        frames_processed: session.frames_processed,
        total_inference_ms: round_latency_ms(inference_ms),
        sentence_in_progress: session.sentence.current(),
    });
    responses
}
