// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data serialization and deserialization.
//!
//! This module handles exporting and importing project data in YAML
//! and JSON formats, and decoding annotation lists coming from storage.

use crate::models::annotation::Annotation;
use crate::models::project::ProjectData;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Export project data to YAML format.
pub fn export_yaml(data: &ProjectData, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Exported {} annotations to {}", data.annotations.len(), path.display());
    Ok(())
}

/// Export project data to JSON format.
pub fn export_json(data: &ProjectData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Exported {} annotations to {}", data.annotations.len(), path.display());
    Ok(())
}

/// Project file as read from disk. Annotation records stay untyped so a
/// bad record can be skipped instead of failing the whole file.
#[derive(Deserialize)]
struct ProjectFile {
    #[serde(default)]
    image_id: Option<String>,
    media_file: String,
    frame_width: u32,
    frame_height: u32,
    #[serde(default)]
    annotations: Vec<Value>,
}

impl From<ProjectFile> for ProjectData {
    fn from(file: ProjectFile) -> Self {
        let mut data = ProjectData::new(file.media_file, file.frame_width, file.frame_height)
            .with_annotations(parse_annotations(file.annotations));
        data.image_id = file.image_id;
        data
    }
}

/// Import project data from YAML format.
pub fn import_yaml(path: &Path) -> Result<ProjectData> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ProjectFile = serde_yaml::from_str(&yaml)
        .with_context(|| format!("Invalid YAML project {}", path.display()))?;
    Ok(file.into())
}

/// Import project data from JSON format.
pub fn import_json(path: &Path) -> Result<ProjectData> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ProjectFile = serde_json::from_str(&json)
        .with_context(|| format!("Invalid JSON project {}", path.display()))?;
    Ok(file.into())
}

/// Import a project, picking the format from the file extension.
pub fn import_project(path: &Path) -> Result<ProjectData> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        _ => import_json(path),
    }
}

/// Decode annotation records one by one. Records of an unknown kind or
/// with missing fields are skipped with a warning.
pub fn parse_annotations(values: Vec<Value>) -> Vec<Annotation> {
    let total = values.len();
    let annotations: Vec<Annotation> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(annotation) => Some(annotation),
            Err(e) => {
                log::warn!("Skipping annotation record {}: {}", i, e);
                None
            }
        })
        .collect();
    if annotations.len() < total {
        log::warn!("Loaded {} of {} annotation records", annotations.len(), total);
    }
    annotations
}

/// Decode a JSON array of annotation records, skipping bad entries.
pub fn annotations_from_str(json: &str) -> Result<Vec<Annotation>> {
    let values: Vec<Value> = serde_json::from_str(json).context("Expected a JSON array of annotations")?;
    Ok(parse_annotations(values))
}
