// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{connect, connect_with_key, recv_json, send_text, spawn_server,
    state_without_classifier, test_config};
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;

fn config_with_api_key(key: &str) -> signkit_server::Config {
    let mut config = test_config();
    config.server.api_key = Some(key.to_string());
    config
}

#[tokio::test]
async fn missing_api_key_closes_with_4003() {
    let (addr, server) = spawn_server(state_without_classifier(config_with_api_key("secret"))).await;

    let mut ws = connect(addr).await;
    let message = ws.next().await.unwrap().unwrap();
    match message {
        Message::Close(Some(frame)) => {
            assert_eq!(u16::from(frame.code), 4003);
            assert_eq!(frame.reason.as_str(), "Invalid or missing API key");
        }
        other => panic!("expected a close frame, got {other:?}"),
    }

    server.abort();
}

#[tokio::test]
async fn wrong_api_key_closes_with_4003() {
    let (addr, server) = spawn_server(state_without_classifier(config_with_api_key("secret"))).await;

    let mut ws = connect_with_key(addr, "wrong").await;
    let message = ws.next().await.unwrap().unwrap();
    assert!(matches!(message, Message::Close(Some(_))), "expected a close frame");

    server.abort();
}

#[tokio::test]
async fn valid_api_key_engages_the_protocol() {
    let (addr, server) = spawn_server(state_without_classifier(config_with_api_key("secret"))).await;

    let mut ws = connect_with_key(addr, "secret").await;
    send_text(&mut ws, r#"{"type":"ping"}"#).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["type"], "error");
    assert_eq!(response["message"], "Unknown message type: ping");

    server.abort();
}

#[tokio::test]
async fn unset_api_key_disables_auth() {
    let (addr, server) = spawn_server(state_without_classifier(test_config())).await;

    let mut ws = connect(addr).await;
    send_text(&mut ws, r#"{"type":"ping"}"#).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["type"], "error");

    server.abort();
}
