// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! api: Defines the WebSocket wire contract for SignKit.
//!
//! All messages are single JSON objects discriminated by a `"type"` field.
//! Clients send frames; the server answers with buffering progress,
//! per-frame predictions, completed sentences, or non-terminal errors.
//!
//! # Example (client frame)
//! ```json
//! { "type": "frame", "frame": "<base64 JPEG, optional data: prefix>" }
//! ```
//!
//! # Example (prediction)
//! ```json
//! {
//!   "type": "sign_prediction",
//!   "sign": "Hello",
//!   "confidence": 0.9234,
//!   "is_stable": true,
//!   "is_new_sign": true,
//!   "hands_detected": true,
//!   "all_predictions": { "Hello": 0.9234, "Thank_You": 0.0412 },
//!   "frames_processed": 150,
//!   "total_inference_ms": 45.2,
//!   "sentence_in_progress": "Hello Help"
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boundary rejection for an inbound message.
///
/// The display strings are part of the wire contract; they are echoed back
/// verbatim in the error response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

/// Client-to-server message, validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// A single video frame, base64-encoded JPEG. The field may be absent;
    /// the handler skips such frames silently.
    Frame { frame: Option<String> },
}

impl ClientMessage {
    /// Parses an inbound text message.
    ///
    /// Distinguishes malformed JSON from a well-formed object with an
    /// unrecognized (or missing) `type`, because the two produce different
    /// error responses. Unknown additional fields are ignored.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|_| ParseError::InvalidJson)?;

        match value.get("type") {
            Some(serde_json::Value::String(kind)) if kind == "frame" => {
                let frame = value
                    .get("frame")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from);
                Ok(Self::Frame { frame })
            }
            Some(serde_json::Value::String(kind)) => {
                Err(ParseError::UnknownType(kind.clone()))
            }
            Some(other) => Err(ParseError::UnknownType(other.to_string())),
            None => Err(ParseError::UnknownType("none".to_string())),
        }
    }
}

/// Server-to-client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent per frame while the sliding window is still filling.
    Buffering {
        frames_collected: usize,
        frames_needed: usize,
        hands_detected: bool,
    },
    /// Sent per frame once the window is full.
    SignPrediction {
        sign: String,
        confidence: f64,
        is_stable: bool,
        is_new_sign: bool,
        hands_detected: bool,
        /// Label → probability, in configured action order.
        all_predictions: IndexMap<String, f64>,
        frames_processed: u64,
        total_inference_ms: f64,
        sentence_in_progress: String,
    },
    /// Sent before the prediction of the frame that closed the sentence.
    SentenceComplete { sentence: String },
    /// Non-terminal; the connection continues.
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}

/// Rounds a probability to 4 decimals for the wire.
///
/// Internal computation keeps full precision; rounding happens only when a
/// response is assembled.
pub fn round_confidence(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Rounds a latency to 1 decimal for the wire.
pub fn round_latency_ms(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
