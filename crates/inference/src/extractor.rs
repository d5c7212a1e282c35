// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! JPEG decode and holistic landmark extraction.
//!
//! The landmark artifact is an ONNX export of the holistic landmark graph.
//! Contract: input `(1, 3, 256, 256)` RGB normalized to `[0, 1]`; outputs,
//! in order:
//!
//! | # | Tensor | Shape |
//! |---|---|---|
//! | 0 | pose landmarks | `(1, 33, 4)` — x, y, z, visibility |
//! | 1 | face landmarks | `(1, 468, 3)` |
//! | 2 | left hand landmarks | `(1, 21, 3)` |
//! | 3 | right hand landmarks | `(1, 21, 3)` |
//! | 4 | group presence scores | `(1, 4)` — same order as above |
//!
//! A group's landmarks enter the feature vector only when its presence score
//! clears the detection confidence, or the (typically lower) tracking
//! confidence when the group was present in the previous frame of the same
//! connection. Rejected groups stay zero-filled, matching the training-side
//! layout contract.
//!
//! Model weights are shared read-only across connections through
//! [`LandmarkModel`]; the per-frame tracking state lives in the
//! per-connection [`KeypointExtractor`], which must never be shared.

use std::path::Path;
use std::sync::Arc;

use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::error::{InferenceError, Result};
use signkit_core::features::{
    FACE_RANGE, FACE_VALUES, FEATURE_LEN, LEFT_HAND_RANGE, HAND_VALUES, POSE_RANGE, POSE_VALUES,
    RIGHT_HAND_RANGE,
};
use signkit_core::FeatureFrame;

/// Side length of the square model input.
pub const LANDMARK_INPUT_SIZE: u32 = 256;

const GROUP_COUNT: usize = 4;

/// Read-only landmark model weights, shared across connections.
pub struct LandmarkModel {
    plan: TypedSimplePlan<TypedModel>,
}

struct LandmarkOutput {
    presence: [f32; GROUP_COUNT],
    /// Flattened landmark values per group, in feature-layout order.
    groups: [Vec<f32>; GROUP_COUNT],
}

impl LandmarkModel {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = LANDMARK_INPUT_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| {
                InferenceError::ModelLoad(format!(
                    "failed to load landmark model from {}: {e}",
                    model_path.display()
                ))
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .map_err(|e| InferenceError::ModelLoad(format!("failed to set input fact: {e}")))?
            .into_optimized()
            .map_err(|e| InferenceError::ModelLoad(format!("failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| InferenceError::ModelLoad(format!("failed to build runnable model: {e}")))?;

        tracing::debug!(path = %model_path.display(), "Landmark model optimized and runnable");
        Ok(Self { plan })
    }

    fn run(&self, rgb: &RgbImage) -> Result<LandmarkOutput> {
        let size = LANDMARK_INPUT_SIZE as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size, size),
            |(_, channel, y, x)| f32::from(rgb.get_pixel(x as u32, y as u32)[channel]) / 255.0,
        );

        let outputs = self
            .plan
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| InferenceError::Execution(format!("landmark inference failed: {e}")))?;

        if outputs.len() < GROUP_COUNT + 1 {
            return Err(InferenceError::Execution(format!(
                "landmark model produced {} outputs, expected {}",
                outputs.len(),
                GROUP_COUNT + 1
            )));
        }

        let groups = [
            extract_values(&outputs[0], POSE_VALUES, "pose")?,
            extract_values(&outputs[1], FACE_VALUES, "face")?,
            extract_values(&outputs[2], HAND_VALUES, "left hand")?,
            extract_values(&outputs[3], HAND_VALUES, "right hand")?,
        ];
        let presence_values = extract_values(&outputs[4], GROUP_COUNT, "presence")?;
        let mut presence = [0.0; GROUP_COUNT];
        presence.copy_from_slice(&presence_values);

        Ok(LandmarkOutput { presence, groups })
    }
}

fn extract_values(output: &TValue, expected: usize, name: &str) -> Result<Vec<f32>> {
    let view = output
        .to_array_view::<f32>()
        .map_err(|e| InferenceError::Execution(format!("{name} tensor was not f32: {e}")))?;
    let data = view
        .as_slice()
        .ok_or_else(|| InferenceError::Execution(format!("{name} tensor is not contiguous")))?;
    if data.len() != expected {
        return Err(InferenceError::Execution(format!(
            "{name} tensor has {} values, expected {expected}",
            data.len()
        )));
    }
    Ok(data.to_vec())
}

/// Per-connection extractor: JPEG bytes in, feature frame out.
///
/// Stateful across calls (presence tracking), so every connection owns its
/// own instance; the underlying model weights are shared.
pub struct KeypointExtractor {
    model: Option<Arc<LandmarkModel>>,
    detection_confidence: f32,
    tracking_confidence: f32,
    tracked: [bool; GROUP_COUNT],
}

impl KeypointExtractor {
    pub fn new(
        model: Option<Arc<LandmarkModel>>,
        detection_confidence: f32,
        tracking_confidence: f32,
    ) -> Self {
        Self { model, detection_confidence, tracking_confidence, tracked: [false; GROUP_COUNT] }
    }

    /// Extracts the feature vector for one frame.
    ///
    /// Returns `Ok(None)` when the bytes do not decode as an image — the
    /// caller drops such frames silently. Runs without a landmark model by
    /// emitting all-zero features (no person detected), so the streaming
    /// protocol stays fully functional on a machine without the artifact.
    pub fn extract(&mut self, jpeg: &[u8]) -> Result<Option<FeatureFrame>> {
        let Ok(decoded) = image::load_from_memory(jpeg) else {
            return Ok(None);
        };

        let Some(model) = self.model.as_ref() else {
            self.tracked = [false; GROUP_COUNT];
            return Ok(Some(FeatureFrame::empty()));
        };

        let rgb = decoded
            .resize_exact(LANDMARK_INPUT_SIZE, LANDMARK_INPUT_SIZE, FilterType::Triangle)
            .to_rgb8();
        let output = model.run(&rgb)?;

        let mut features = vec![0.0; FEATURE_LEN];
        let ranges = [POSE_RANGE, FACE_RANGE, LEFT_HAND_RANGE, RIGHT_HAND_RANGE];
        for (group, range) in ranges.into_iter().enumerate() {
            let threshold = if self.tracked[group] {
                self.tracking_confidence
            } else {
                self.detection_confidence
            };
            let present = output.presence[group] >= threshold;
            if present {
                features[range].copy_from_slice(&output.groups[group]);
            }
            self.tracked[group] = present;
        }

        Ok(Some(FeatureFrame::new(features)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn tiny_jpeg() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([120, 30, 200])));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Jpeg).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn corrupt_bytes_are_a_silent_no_feature() {
        let mut extractor = KeypointExtractor::new(None, 0.5, 0.5);
        assert!(extractor.extract(b"definitely not a jpeg").unwrap().is_none());
    }

    #[test]
    fn empty_payload_is_a_silent_no_feature() {
        let mut extractor = KeypointExtractor::new(None, 0.5, 0.5);
        assert!(extractor.extract(&[]).unwrap().is_none());
    }

    #[test]
    fn without_a_model_frames_decode_to_zero_features() {
        let mut extractor = KeypointExtractor::new(None, 0.5, 0.5);
        let frame = extractor.extract(&tiny_jpeg()).unwrap().unwrap();
        assert_eq!(frame.features.len(), FEATURE_LEN);
        assert!(frame.features.iter().all(|v| *v == 0.0));
        assert!(!frame.hands_detected);
    }

    #[test]
    fn missing_landmark_artifact_is_a_load_error() {
        let result = LandmarkModel::load("/nonexistent/holistic_landmarks.onnx");
        assert!(matches!(result, Err(InferenceError::ModelLoad(_))));
    }
}
