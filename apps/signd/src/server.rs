// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! HTTP surface: health endpoint, WebSocket upgrade, CORS, startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ws::{CloseFrame, Message, WebSocketUpgrade},
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use signkit_inference::{ClassifierAdapter, LandmarkModel, TractClassifier};

use crate::config::Config;
use crate::state::AppState;
use crate::websocket;

/// Close code for authentication failures, the only code the server uses
/// intentionally.
const CLOSE_CODE_AUTH: u16 = 4003;

async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let detection = &app_state.config.detection;
    Json(serde_json::json!({
        "status": "ok",
        "model_loaded": app_state.classifier.is_some(),
        "actions": detection.actions,
        "sequence_length": detection.sequence_length,
        "avg_inference_ms": app_state.latency.average_ms(),
    }))
}

/// Matches an Origin header value against a configured pattern.
///
/// Supports `*` (all origins) and wildcard ports (`http://localhost:*`).
fn origin_matches_pattern(origin: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if let Some(prefix_without_port) = pattern.strip_suffix(":*") {
        let Some(rest) = origin.strip_prefix(prefix_without_port) else {
            return false;
        };
        let Some(port_str) = rest.strip_prefix(':') else {
            return false;
        };
        return !port_str.is_empty() && port_str.chars().all(|c| c.is_ascii_digit());
    }

    origin == pattern
}

fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    use axum::http::{HeaderValue, Method};

    if allowed_origins.iter().any(|o| o == "*") {
        info!("CORS configured to allow all origins (permissive mode)");
        return CorsLayer::permissive();
    }

    if allowed_origins.is_empty() {
        info!("CORS configured with no allowed origins (most restrictive)");
        return CorsLayer::new();
    }

    let patterns: Vec<String> = allowed_origins.to_vec();
    info!(allowed_origins = ?patterns, "CORS configured with origin allowlist");

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _request_parts| {
        let Ok(origin_str) = origin.to_str() else {
            return false;
        };
        patterns.iter().any(|pattern| origin_matches_pattern(origin_str, pattern))
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
struct WsConnectQuery {
    api_key: Option<String>,
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsConnectQuery>,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        if let Some(expected) = app_state.config.server.api_key.as_deref() {
            if query.api_key.as_deref() != Some(expected) {
                warn!("Rejecting WebSocket connection: invalid or missing API key");
                let close = Message::Close(Some(CloseFrame {
                    code: CLOSE_CODE_AUTH,
                    reason: "Invalid or missing API key".into(),
                }));
                let _ = socket.send(close).await;
                return;
            }
        }
        websocket::handle_websocket(socket, app_state).await;
    })
}

/// Loads the model artifacts and assembles the shared state.
///
/// Loading failures are logged, never fatal: the server keeps serving, the
/// health endpoint reports `model_loaded=false`, and the classify step emits
/// per-frame error responses until an artifact is provided.
pub fn create_app(config: Config) -> (Router, Arc<AppState>) {
    let detection = &config.detection;
    let classifier = match TractClassifier::load(
        &config.model.classifier_path,
        detection.sequence_length,
        detection.actions.len(),
    ) {
        Ok(model) => {
            info!(
                path = %config.model.classifier_path,
                actions = detection.actions.len(),
                sequence_length = detection.sequence_length,
                "Sign classifier loaded"
            );
            Some(ClassifierAdapter::new(Arc::new(model)))
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %config.model.classifier_path,
                "Running without a sign classifier; predictions will error until an artifact is provided"
            );
            None
        }
    };

    let landmarks = match LandmarkModel::load(&config.model.landmark_path) {
        Ok(model) => {
            info!(path = %config.model.landmark_path, "Landmark model loaded");
            Some(Arc::new(model))
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %config.model.landmark_path,
                "Running without a landmark model; frames will extract empty features"
            );
            None
        }
    };

    let app_state = Arc::new(AppState::new(config, classifier, landmarks));
    let router = create_app_with_state(Arc::clone(&app_state));
    (router, app_state)
}

/// Builds the router over pre-assembled state. Tests use this to inject
/// scripted classifiers.
pub fn create_app_with_state(app_state: Arc<AppState>) -> Router {
    let cors_layer = create_cors_layer(&app_state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/sign-detection", get(websocket_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
}

/// Binds the listener and serves until ctrl-c.
///
/// # Errors
///
/// Returns an error when the address cannot be parsed or bound, or when the
/// server encounters a runtime error.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let (app, app_state) = create_app(config);
    info!(
        address = %addr,
        model_loaded = app_state.classifier.is_some(),
        "Starting signd server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

#[cfg(test)]
mod cors_tests {
    use super::origin_matches_pattern;

    #[test]
    fn cors_wildcard_port_matches_localhost_port_only() {
        assert!(origin_matches_pattern("http://localhost:8080", "http://localhost:*"));
        assert!(origin_matches_pattern("https://localhost:12345", "https://localhost:*"));

        assert!(!origin_matches_pattern("http://localhost", "http://localhost:*"));
        assert!(!origin_matches_pattern("http://localhost:abc", "http://localhost:*"));
        assert!(!origin_matches_pattern("http://localhost123:8080", "http://localhost:*"));
        assert!(!origin_matches_pattern("http://127.0.0.1:8080", "http://localhost:*"));
    }

    #[test]
    fn cors_exact_match_only() {
        assert!(origin_matches_pattern("https://example.com", "https://example.com"));
        assert!(!origin_matches_pattern("https://example.com:443", "https://example.com"));
        assert!(!origin_matches_pattern("https://example.com", "https://example.com:*"));
    }

    #[test]
    fn cors_star_matches_everything() {
        assert!(origin_matches_pattern("https://anything.example", "*"));
    }
}
