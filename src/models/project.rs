// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state for export and import.
//!
//! A project ties the annotation list to the background image it was
//! drawn over.

use super::annotation::Annotation;
use serde::{Deserialize, Serialize};

/// Complete project data for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectData {
    /// Identifier of the image in the annotation store, if it came from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub media_file: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub annotations: Vec<Annotation>,
}

impl ProjectData {
    /// Create a new project with the given media file and dimensions.
    pub fn new(media_file: String, frame_width: u32, frame_height: u32) -> Self {
        Self {
            image_id: None,
            media_file,
            frame_width,
            frame_height,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }
}
