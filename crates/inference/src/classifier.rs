// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The sequence classifier.
//!
//! The trained artifact is an ONNX export of the LSTM sequence model: input
//! `(1, W, 1662)` f32, output `(1, N)` softmax over the configured actions.
//! [`SignClassifier`] is the seam between the connection handler and the
//! tensor runtime; tests drive the handler with scripted implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tract_onnx::prelude::*;

use crate::error::{InferenceError, Result};
use signkit_core::FEATURE_LEN;

/// A loaded sequence model: full window of feature vectors in, probability
/// distribution out.
pub trait SignClassifier: Send + Sync {
    /// Number of output classes (must match the configured action list).
    fn class_count(&self) -> usize;

    /// Runs the model over one window snapshot, oldest frame first.
    fn predict(&self, window: &[Vec<f32>]) -> Result<Vec<f32>>;
}

/// Index and probability of the most likely class.
pub fn top_prediction(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, value)| (index, *value))
}

/// Tract-backed classifier over an ONNX artifact.
pub struct TractClassifier {
    plan: TypedSimplePlan<TypedModel>,
    sequence_length: usize,
    class_count: usize,
}

impl TractClassifier {
    /// Loads and optimizes the ONNX model, pinning the input fact to
    /// `(1, sequence_length, 1662)`.
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        sequence_length: usize,
        class_count: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| {
                InferenceError::ModelLoad(format!(
                    "failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, sequence_length, FEATURE_LEN),
                ),
            )
            .map_err(|e| InferenceError::ModelLoad(format!("failed to set input fact: {e}")))?
            .into_optimized()
            .map_err(|e| InferenceError::ModelLoad(format!("failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| InferenceError::ModelLoad(format!("failed to build runnable model: {e}")))?;

        tracing::debug!(
            path = %model_path.display(),
            sequence_length,
            class_count,
            "Sequence classifier optimized and runnable"
        );
        Ok(Self { plan, sequence_length, class_count })
    }

    fn build_input(&self, window: &[Vec<f32>]) -> Result<Tensor> {
        if window.len() != self.sequence_length {
            return Err(InferenceError::InvalidInput(format!(
                "expected {} frames, got {}",
                self.sequence_length,
                window.len()
            )));
        }

        let mut input =
            tract_ndarray::Array3::<f32>::zeros((1, self.sequence_length, FEATURE_LEN));
        for (frame_index, frame) in window.iter().enumerate() {
            if frame.len() != FEATURE_LEN {
                return Err(InferenceError::InvalidInput(format!(
                    "expected {FEATURE_LEN} features per frame, got {}",
                    frame.len()
                )));
            }
            for (feature_index, value) in frame.iter().enumerate() {
                input[(0, frame_index, feature_index)] = *value;
            }
        }
        Ok(input.into_tensor())
    }
}

impl SignClassifier for TractClassifier {
    fn class_count(&self) -> usize {
        self.class_count
    }

    fn predict(&self, window: &[Vec<f32>]) -> Result<Vec<f32>> {
        let input = self.build_input(window)?;
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Execution(format!("ONNX inference failed: {e}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::Execution("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Execution(format!("output tensor was not f32: {e}")))?;
        let data = view
            .as_slice()
            .ok_or_else(|| InferenceError::Execution("output tensor is not contiguous".to_string()))?;

        if data.len() != self.class_count {
            return Err(InferenceError::Execution(format!(
                "expected {} class probabilities, got {}",
                self.class_count,
                data.len()
            )));
        }
        Ok(data.to_vec())
    }
}

/// Async wrapper the connection handler talks to.
///
/// Off-loads the blocking tensor run so the scheduler stays responsive, and
/// measures wall-clock latency around the whole hand-off so the reported
/// number is end-to-end for that frame.
#[derive(Clone)]
pub struct ClassifierAdapter {
    inner: Arc<dyn SignClassifier>,
}

impl ClassifierAdapter {
    pub fn new(inner: Arc<dyn SignClassifier>) -> Self {
        Self { inner }
    }

    pub fn class_count(&self) -> usize {
        self.inner.class_count()
    }

    /// Classifies one window snapshot, returning the probabilities and the
    /// end-to-end latency in milliseconds.
    pub async fn predict(&self, window: Vec<Vec<f32>>) -> Result<(Vec<f32>, f64)> {
        let started = Instant::now();
        let inner = Arc::clone(&self.inner);
        let probabilities = tokio::task::spawn_blocking(move || inner.predict(&window))
            .await
            .map_err(|e| InferenceError::Execution(format!("inference task failed: {e}")))??;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        Ok((probabilities, elapsed_ms))
    }
}
