// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Pause-based segmentation of stable signs into sentences.
//!
//! Signs accumulate as they stabilize; a sentence closes when a new sign
//! arrives after a silence longer than the configured timeout. The boundary
//! check is lazy — it runs only when the next new sign arrives — which makes
//! exactly-once completion structural rather than something a timer has to
//! coordinate.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SentenceAssembler {
    timeout: Duration,
    signs: Vec<String>,
    last_new_sign: Option<Instant>,
}

impl SentenceAssembler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, signs: Vec::new(), last_new_sign: None }
    }

    /// Feeds one new-sign event at time `now`.
    ///
    /// Returns the completed sentence when the pause before this sign
    /// exceeded the timeout; the new sign then starts the next sentence.
    pub fn observe_new_sign(&mut self, sign: &str, now: Instant) -> Option<String> {
        let completed = match self.last_new_sign {
            Some(previous)
                if !self.signs.is_empty()
                    && now.duration_since(previous) > self.timeout =>
            {
                let sentence = self.signs.join(" ");
                self.signs.clear();
                Some(sentence)
            }
            _ => None,
        };

        self.signs.push(sign.to_string());
        self.last_new_sign = Some(now);
        completed
    }

    /// The in-progress sentence, joined by single spaces (possibly empty).
    pub fn current(&self) -> String {
        self.signs.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }
}
