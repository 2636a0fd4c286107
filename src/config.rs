// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Interaction thresholds, debounce timing and storage location. Loaded
//! from a YAML or JSON file; every field falls back to its default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Max screen distance from an edge for vertex insertion.
    pub insert_threshold_px: f64,
    /// Screen radius around the first draft point that closes a polygon.
    pub close_radius_px: f64,
    /// Screen radius for grabbing a vertex handle.
    pub handle_radius_px: f64,
    /// Clicks closer than this to the previous draft point are ignored.
    pub duplicate_click_px: f64,
    /// Idle time after the last drag sample before it is committed.
    pub commit_delay_ms: u64,
    /// Zoom ratio for the zoom in/out buttons.
    pub button_zoom_step: f64,
    /// Wheel zoom factor is `wheel_zoom_base ^ scroll_delta`.
    pub wheel_zoom_base: f64,
    /// Maximum number of snapshots kept; 0 keeps everything.
    pub history_limit: usize,
    /// Root directory of the local annotation store.
    pub store_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            insert_threshold_px: 8.0,
            close_radius_px: 12.0,
            handle_radius_px: 6.0,
            duplicate_click_px: 2.0,
            commit_delay_ms: 150,
            button_zoom_step: 1.1,
            wheel_zoom_base: 0.999,
            history_limit: 100,
            store_dir: PathBuf::from("labelcanvas-data"),
        }
    }
}

impl EditorConfig {
    /// Load configuration from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON config {}", path.display()))?,
            _ => serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid YAML config {}", path.display()))?,
        };
        Ok(config)
    }

    /// Load configuration, using defaults when the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{:#}; using default config", e);
                Self::default()
            }
        }
    }

    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labelcanvas.yaml");
        std::fs::write(&path, "close_radius_px: 20\ncommit_delay_ms: 300\n").unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.close_radius_px, 20.0);
        assert_eq!(config.commit_delay(), Duration::from_millis(300));
        assert_eq!(config.insert_threshold_px, 8.0);
    }

    #[test]
    fn test_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labelcanvas.json");
        std::fs::write(&path, r#"{"history_limit": 5}"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.history_limit, 5);
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert_eq!(EditorConfig::load_or_default(&missing), EditorConfig::default());

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "close_radius_px: [").unwrap();
        assert_eq!(EditorConfig::load_or_default(&broken), EditorConfig::default());
    }
}
