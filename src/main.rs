// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! LabelCanvas - image annotation editor
//!
//! A cross-platform desktop application for drawing, editing and labeling
//! vector shapes over a background image.

mod app;
mod ui;

use anyhow::Result;
use app::LabelCanvasApp;
use labelcanvas::config::EditorConfig;
use std::path::PathBuf;

/// Config file looked up in the working directory unless overridden.
const CONFIG_FILE: &str = "labelcanvas.yaml";

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = EditorConfig::load_or_default(&config_path);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("LabelCanvas - Image Annotation Editor"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "LabelCanvas",
        options,
        Box::new(move |_cc| Ok(Box::new(LabelCanvasApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
