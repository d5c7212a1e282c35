// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The configured set of recognizable sign labels.
//!
//! The classifier's output distribution is indexed by this list; its order
//! must match the order used at training time.

use serde::{Deserialize, Serialize};

/// Ordered list of action labels the classifier can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actions(Vec<String>);

impl Default for Actions {
    fn default() -> Self {
        Self(
            [
                "Hello", "Thank_You", "Please", "Help", "Yes", "No", "Sorry", "Goodbye", "Love",
                "Stop",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        )
    }
}

impl Actions {
    /// Parses a comma-separated label list, trimming whitespace around each
    /// entry. Returns `None` when no non-empty label remains, so callers can
    /// fall back to the default set.
    pub fn from_csv(csv: &str) -> Option<Self> {
        let labels: Vec<String> =
            csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The label for a classifier output index.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
