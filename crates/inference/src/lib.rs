// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! SignKit Inference - the tensor runtime boundary.
//!
//! This crate is the only place allowed to touch the ONNX runtime or image
//! decoding; everything else in the workspace sees plain float slices and
//! [`signkit_core::FeatureFrame`]s.
//!
//! - [`classifier`]: The sequence classifier behind the [`classifier::SignClassifier`]
//!   trait, plus the async timing adapter the connection handler uses
//! - [`extractor`]: JPEG decode + holistic landmark extraction into the
//!   1662-value feature layout
//! - [`error`]: Error types shared by both

pub mod classifier;
pub mod error;
pub mod extractor;

pub use classifier::{top_prediction, ClassifierAdapter, SignClassifier, TractClassifier};
pub use error::{InferenceError, Result};
pub use extractor::{KeypointExtractor, LandmarkModel};
