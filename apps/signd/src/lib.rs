// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! signd: the SignKit real-time sign-detection server.
//!
//! Exposes a single WebSocket endpoint (`/ws/sign-detection`) that turns a
//! stream of base64 JPEG frames into buffering progress, per-frame sign
//! predictions, and pause-segmented sentences, plus a `/health` endpoint
//! for liveness and model status. See `signkit-api` for the wire contract.

pub mod cli;
pub mod config;
pub mod logging;
pub mod server;
pub mod session;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use server::{create_app, create_app_with_state, start_server};
pub use state::AppState;
