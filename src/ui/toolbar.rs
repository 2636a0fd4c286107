// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! This module provides the toolbar interface for selecting the tool mode
//! and for the zoom and undo/redo shortcuts.

use labelcanvas::editor::{Editor, ToolMode};

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    SetMode(ToolMode),
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Undo,
    Redo,
}

fn icon(mode: ToolMode) -> &'static str {
    match mode {
        ToolMode::Select => "⬆",
        ToolMode::Pan => "✋",
        ToolMode::Rectangle => "▭",
        ToolMode::Circle => "◯",
        ToolMode::PolygonDraw => "▱",
        ToolMode::Freehand => "✏",
        ToolMode::Point => "•",
        ToolMode::Text => "T",
        ToolMode::AddVertex => "+",
        ToolMode::DeleteVertex => "−",
    }
}

/// Display the toolbar with tool selection buttons.
pub fn show(ui: &mut egui::Ui, editor: &Editor) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let current = editor.mode();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        for mode in ToolMode::ALL {
            let text = format!("{} {}", icon(mode), mode.label());
            if ui.selectable_label(current == mode, text).clicked() {
                action = ToolbarAction::SetMode(mode);
            }
        }

        ui.separator();

        if ui.button("🔍+").on_hover_text("Zoom in").clicked() {
            action = ToolbarAction::ZoomIn;
        }
        if ui.button("🔍−").on_hover_text("Zoom out").clicked() {
            action = ToolbarAction::ZoomOut;
        }
        if ui.button("1:1").on_hover_text("Reset zoom").clicked() {
            action = ToolbarAction::ResetZoom;
        }
        ui.label(format!("{:.0}%", editor.viewport().zoom() * 100.0));

        ui.separator();

        if ui.add_enabled(editor.can_undo(), egui::Button::new("↶")).on_hover_text("Undo").clicked() {
            action = ToolbarAction::Undo;
        }
        if ui.add_enabled(editor.can_redo(), egui::Button::new("↷")).on_hover_text("Redo").clicked() {
            action = ToolbarAction::Redo;
        }
    });

    ui.label(egui::RichText::new(current.hint()).italics().weak());

    action
}
