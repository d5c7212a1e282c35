// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Rolling inference-latency average.
//!
//! The only mutable state shared across connections. Updates come from every
//! connection task, so the sample window sits behind a mutex; contention is
//! negligible at one short lock per classified frame.

use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
pub struct RollingLatency {
    capacity: usize,
    samples: Mutex<VecDeque<f64>>,
}

impl RollingLatency {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, samples: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    /// Records one end-to-end inference latency in milliseconds.
    pub fn record(&self, ms: f64) {
        let mut samples = self.samples.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(ms);
    }

    /// Mean over the retained samples, or 0.0 before any inference ran.
    pub fn average_ms(&self) -> f64 {
        let samples = self.samples.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

impl Default for RollingLatency {
    /// Window of 100 samples, matching the health endpoint contract.
    fn default() -> Self {
        Self::new(100)
    }
}
