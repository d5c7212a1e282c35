// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Confidence-gated smoothing over consecutive classifier outputs.
//!
//! Raw per-frame predictions jitter: a signer transitioning between glosses
//! produces a run of low-confidence or flickering top-1 labels. The filter
//! only declares a sign *stable* once the same class has been the top-1,
//! above the confidence threshold, for a full window of consecutive
//! classifications — and flags the single frame on which a newly stable sign
//! replaces the previous one.

use std::collections::VecDeque;

/// Outcome of feeding one classification into the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityUpdate {
    /// The history window is full and unanimous for one class.
    pub is_stable: bool,
    /// First frame on which a stable sign differs from its predecessor.
    pub is_new_sign: bool,
}

/// Bounded vote history over the last `window` classifications.
#[derive(Debug)]
pub struct StabilityFilter {
    window: usize,
    threshold: f32,
    /// `Some(class)` when that frame's confidence cleared the threshold.
    history: VecDeque<Option<usize>>,
    /// Most recently emitted stable class.
    stable: Option<usize>,
}

impl StabilityFilter {
    pub fn new(window: usize, threshold: f32) -> Self {
        assert!(window > 0, "stability window must be positive");
        Self { window, threshold, history: VecDeque::with_capacity(window), stable: None }
    }

    /// Records the raw top-1 classification for one frame.
    pub fn update(&mut self, class: usize, confidence: f32) -> StabilityUpdate {
        let observation = if confidence >= self.threshold { Some(class) } else { None };
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(observation);

        let unanimous = match self.history.front() {
            Some(&Some(first)) if self.history.len() == self.window => {
                self.history.iter().all(|o| *o == Some(first)).then_some(first)
            }
            _ => None,
        };

        let Some(label) = unanimous else {
            return StabilityUpdate { is_stable: false, is_new_sign: false };
        };

        let is_new_sign = self.stable != Some(label);
        if is_new_sign {
            self.stable = Some(label);
        }
        StabilityUpdate { is_stable: true, is_new_sign }
    }

    /// The most recently stabilized class, if any.
    pub fn stable_class(&self) -> Option<usize> {
        self.stable
    }
}
