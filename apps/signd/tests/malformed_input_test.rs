// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{
    expect_silence, jpeg_frame, recv_json, send_frame, send_text, spawn_server,
    state_without_classifier, test_config,
};

#[tokio::test]
async fn invalid_json_gets_an_error_response() {
    let (addr, server) = spawn_server(state_without_classifier(test_config())).await;
    let mut ws = common::connect(addr).await;

    send_text(&mut ws, "not json").await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["type"], "error");
    assert_eq!(response["message"], "Invalid JSON");

    server.abort();
}

#[tokio::test]
async fn unknown_type_echoes_the_value() {
    let (addr, server) = spawn_server(state_without_classifier(test_config())).await;
    let mut ws = common::connect(addr).await;

    send_text(&mut ws, r#"{"type":"ping"}"#).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["message"], "Unknown message type: ping");

    send_text(&mut ws, r#"{"frame":"abcd"}"#).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["message"], "Unknown message type: none");

    server.abort();
}

#[tokio::test]
async fn empty_frame_and_prefix_only_data_url_are_silent() {
    let (addr, server) = spawn_server(state_without_classifier(test_config())).await;
    let mut ws = common::connect(addr).await;

    send_frame(&mut ws, "").await;
    expect_silence(&mut ws).await;

    send_frame(&mut ws, "data:image/jpeg;base64").await;
    expect_silence(&mut ws).await;

    server.abort();
}

#[tokio::test]
async fn connection_survives_a_burst_of_garbage() {
    let (addr, server) = spawn_server(state_without_classifier(test_config())).await;
    let mut ws = common::connect(addr).await;

    send_text(&mut ws, "not json").await;
    recv_json(&mut ws).await;
    send_frame(&mut ws, "!!!bad-base64!!!").await;
    expect_silence(&mut ws).await;
    send_frame(&mut ws, "aGVsbG8gd29ybGQ=").await; // valid base64, not a JPEG
    expect_silence(&mut ws).await;

    // A good frame still processes normally.
    send_frame(&mut ws, &jpeg_frame()).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["type"], "buffering");
    assert_eq!(response["frames_collected"], 1);
    assert_eq!(response["frames_needed"], 3);
    assert_eq!(response["hands_detected"], false);

    server.abort();
}

#[tokio::test]
async fn data_url_wrapped_frame_is_equivalent_to_bare() {
    let (addr, server) = spawn_server(state_without_classifier(test_config())).await;
    let mut ws = common::connect(addr).await;

    let payload = jpeg_frame();
    send_frame(&mut ws, &format!("data:image/jpeg;base64,{payload}")).await;
    let first = recv_json(&mut ws).await;
    assert_eq!(first["type"], "buffering");
    assert_eq!(first["frames_collected"], 1);

    send_frame(&mut ws, &payload).await;
    let second = recv_json(&mut ws).await;
    assert_eq!(second["frames_collected"], 2);

    server.abort();
}
