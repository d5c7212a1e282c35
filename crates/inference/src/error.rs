// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The artifact could not be loaded or did not match the expected I/O
    /// contract. Surfaced at startup; the server keeps running degraded.
    #[error("Model loading error: {0}")]
    ModelLoad(String),

    /// The caller handed the runtime a malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The runtime failed while executing a loaded model.
    #[error("Inference execution error: {0}")]
    Execution(String),
}
