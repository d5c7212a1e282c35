// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Per-connection session state.

use signkit_core::{FrameRateLimiter, SentenceAssembler, SlidingWindow, StabilityFilter};
use signkit_inference::KeypointExtractor;

use crate::state::AppState;

/// Everything one WebSocket connection owns.
///
/// Created on accept, dropped on close. The extractor carries mutable
/// tracking state and is confined to this connection's task; only the model
/// weights behind it are shared.
pub struct ConnectionSession {
    pub extractor: KeypointExtractor,
    pub window: SlidingWindow,
    pub stability: StabilityFilter,
    pub sentence: SentenceAssembler,
    pub limiter: FrameRateLimiter,
    /// Frames that made it into the window, monotonically increasing.
    pub frames_processed: u64,
}

impl ConnectionSession {
    pub fn new(state: &AppState) -> Self {
        let detection = &state.config.detection;
        let rate_limit = &state.config.rate_limit;
        Self {
            extractor: KeypointExtractor::new(
                state.landmarks.clone(),
                detection.min_detection_confidence,
                detection.min_tracking_confidence,
            ),
            window: SlidingWindow::new(detection.sequence_length),
            stability: StabilityFilter::new(
                detection.stability_window,
                detection.confidence_threshold,
            ),
            sentence: SentenceAssembler::new(detection.sentence_timeout()),
            limiter: FrameRateLimiter::new(rate_limit.max_frames, rate_limit.window()),
            frames_processed: 0,
        }
    }
}
