// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! SignKit Core - Data contracts and per-connection state machines for
//! real-time sign detection.
//!
//! Everything in this crate is deterministic and I/O-free. Each WebSocket
//! connection composes one instance of every state machine here; nothing is
//! shared across connections except [`metrics::RollingLatency`], which is
//! explicitly thread-safe.
//!
//! ## Modules
//!
//! - [`features`]: The 1662-value holistic feature vector layout
//! - [`actions`]: The configured set of recognizable sign labels
//! - [`window`]: Sliding temporal buffer of feature vectors
//! - [`stability`]: Confidence-gated smoothing over consecutive predictions
//! - [`sentence`]: Pause-based segmentation of stable signs into sentences
//! - [`rate_limit`]: Per-connection sliding-window frame admission
//! - [`metrics`]: Rolling inference-latency average

pub mod actions;
pub mod features;
pub mod metrics;
pub mod rate_limit;
pub mod sentence;
pub mod stability;
pub mod window;

pub use actions::Actions;
pub use features::{FeatureFrame, FEATURE_LEN};
pub use metrics::RollingLatency;
pub use rate_limit::FrameRateLimiter;
pub use sentence::SentenceAssembler;
pub use stability::{StabilityFilter, StabilityUpdate};
pub use window::SlidingWindow;
