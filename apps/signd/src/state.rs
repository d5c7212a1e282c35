// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::sync::Arc;

use signkit_core::RollingLatency;
use signkit_inference::{ClassifierAdapter, LandmarkModel};

use crate::config::Config;

/// Process-global state shared by every connection.
///
/// Everything here is read-only after startup except the latency window,
/// which serializes its own updates. All per-connection state lives in
/// [`crate::session::ConnectionSession`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Absent when the classifier artifact failed to load; the health
    /// endpoint reports it and the classify step errors per frame.
    pub classifier: Option<ClassifierAdapter>,
    /// Absent when the landmark artifact failed to load; frames then decode
    /// to all-zero features.
    pub landmarks: Option<Arc<LandmarkModel>>,
    pub latency: Arc<RollingLatency>,
}

impl AppState {
    pub fn new(
        config: Config,
        classifier: Option<ClassifierAdapter>,
        landmarks: Option<Arc<LandmarkModel>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
            landmarks,
            latency: Arc::new(RollingLatency::default()),
        }
    }
}
