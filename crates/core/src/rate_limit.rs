// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Per-connection sliding-window frame admission.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Admits at most `max_frames` frames per rolling `window`.
///
/// Keeps the admission timestamps of the last `max_frames` accepted frames.
/// A frame is admitted while the FIFO has room, or once the span from the
/// oldest admission to the incoming frame reaches the window length.
#[derive(Debug)]
pub struct FrameRateLimiter {
    max_frames: usize,
    window: Duration,
    admitted: VecDeque<Instant>,
}

impl FrameRateLimiter {
    pub fn new(max_frames: usize, window: Duration) -> Self {
        Self { max_frames, window, admitted: VecDeque::with_capacity(max_frames) }
    }

    /// Attempts to admit a frame arriving at `now`.
    pub fn try_admit(&mut self, now: Instant) -> bool {
        if self.max_frames == 0 {
            return false;
        }
        if self.admitted.len() == self.max_frames {
            match self.admitted.front() {
                Some(&oldest) if now.duration_since(oldest) < self.window => return false,
                _ => {
                    self.admitted.pop_front();
                }
            }
        }
        self.admitted.push_back(now);
        true
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
