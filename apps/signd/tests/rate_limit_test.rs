// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use common::{jpeg_frame, recv_json, send_frame, spawn_server, state_without_classifier,
    test_config};

#[tokio::test]
async fn excess_frames_get_the_rate_limit_error() {
    let mut config = test_config();
    config.detection.sequence_length = 30;
    config.rate_limit.max_frames = 3;
    config.rate_limit.window_s = 60.0;
    let (addr, server) = spawn_server(state_without_classifier(config)).await;
    let mut ws = common::connect(addr).await;
    let frame = jpeg_frame();

    for expected in 1..=3 {
        send_frame(&mut ws, &frame).await;
        let response = recv_json(&mut ws).await;
        assert_eq!(response["type"], "buffering");
        assert_eq!(response["frames_collected"], expected);
    }

    send_frame(&mut ws, &frame).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["type"], "error");
    assert_eq!(response["message"], "Rate limit exceeded: max 3 frames per 60 seconds");

    server.abort();
}

#[tokio::test]
async fn rejected_frames_do_not_advance_the_counter() {
    let mut config = test_config();
    config.detection.sequence_length = 30;
    config.rate_limit.max_frames = 2;
    config.rate_limit.window_s = 60.0;
    let (addr, server) = spawn_server(state_without_classifier(config)).await;
    let mut ws = common::connect(addr).await;
    let frame = jpeg_frame();

    send_frame(&mut ws, &frame).await;
    recv_json(&mut ws).await;
    send_frame(&mut ws, &frame).await;
    let last_ok = recv_json(&mut ws).await;
    assert_eq!(last_ok["frames_collected"], 2);

    send_frame(&mut ws, &frame).await;
    let rejected = recv_json(&mut ws).await;
    assert_eq!(rejected["type"], "error");

    server.abort();
}

#[tokio::test]
async fn the_limiter_recovers_after_the_window() {
    let mut config = test_config();
    config.detection.sequence_length = 30;
    config.rate_limit.max_frames = 2;
    config.rate_limit.window_s = 1.0;
    let (addr, server) = spawn_server(state_without_classifier(config)).await;
    let mut ws = common::connect(addr).await;
    let frame = jpeg_frame();

    send_frame(&mut ws, &frame).await;
    recv_json(&mut ws).await;
    send_frame(&mut ws, &frame).await;
    recv_json(&mut ws).await;

    send_frame(&mut ws, &frame).await;
    let rejected = recv_json(&mut ws).await;
    assert_eq!(rejected["type"], "error");

    tokio::time::sleep(Duration::from_millis(1100)).await;

    send_frame(&mut ws, &frame).await;
    let response = recv_json(&mut ws).await;
    assert_eq!(response["type"], "buffering");
    assert_eq!(response["frames_collected"], 3);

    server.abort();
}
