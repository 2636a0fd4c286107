// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation list and properties panel.

use labelcanvas::models::annotation::{Annotation, Shape, ShapeId};

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    Select(ShapeId),
    SetLabel(ShapeId, String),
    SetText(ShapeId, String),
    SetTransform {
        id: ShapeId,
        angle: f64,
        scale_x: f64,
        scale_y: f64,
    },
    Delete(ShapeId),
}

/// Edit buffers for the selected annotation. They are refreshed whenever
/// the annotation changes underneath them.
#[derive(Default)]
pub struct PanelState {
    shown: Option<Annotation>,
    label: String,
    text: String,
    angle: f64,
    scale_x: f64,
    scale_y: f64,
}

impl PanelState {
    /// Force the buffers to reload on the next frame.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    fn sync(&mut self, annotation: &Annotation) {
        if self.shown.as_ref() == Some(annotation) {
            return;
        }
        self.label = annotation.label.clone().unwrap_or_default();
        self.text = match &annotation.shape {
            Shape::Text { text, .. } => text.clone(),
            _ => String::new(),
        };
        self.angle = annotation.rotation;
        self.scale_x = annotation.scale_x;
        self.scale_y = annotation.scale_y;
        self.shown = Some(annotation.clone());
    }
}

/// Commit a drag value once the user lets go or types a value.
fn settled(response: &egui::Response) -> bool {
    response.drag_stopped() || (response.changed() && !response.dragged())
}

pub fn show(
    ui: &mut egui::Ui,
    annotations: &[Annotation],
    selected: Option<&ShapeId>,
    state: &mut PanelState,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Annotations");
    ui.label(format!("{} shapes", annotations.len()));
    ui.separator();

    egui::ScrollArea::vertical()
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            for annotation in annotations {
                let is_selected = selected == Some(&annotation.id);
                let text = format!(
                    "{} · {}",
                    annotation.kind(),
                    annotation.label.as_deref().unwrap_or("(unlabeled)")
                );
                if ui.selectable_label(is_selected, text).clicked() {
                    action = PropertiesAction::Select(annotation.id.clone());
                }
            }
        });

    let Some(annotation) = selected.and_then(|id| annotations.iter().find(|a| &a.id == id)) else {
        state.shown = None;
        return action;
    };
    state.sync(annotation);
    let id = annotation.id.clone();

    ui.separator();
    ui.label(egui::RichText::new(annotation.kind().to_string()).strong());
    ui.label(format!(
        "Position: ({:.1}, {:.1})",
        annotation.position.x, annotation.position.y
    ));
    if let Some(n) = annotation.vertex_count() {
        ui.label(format!("Vertices: {}", n));
    }

    ui.horizontal(|ui| {
        ui.label("Label:");
        let response = ui.text_edit_singleline(&mut state.label);
        if response.lost_focus() && annotation.label.as_deref().unwrap_or("") != state.label {
            action = PropertiesAction::SetLabel(id.clone(), state.label.clone());
        }
    });

    if matches!(annotation.shape, Shape::Text { .. }) {
        ui.horizontal(|ui| {
            ui.label("Text:");
            let response = ui.text_edit_singleline(&mut state.text);
            if response.lost_focus() {
                action = PropertiesAction::SetText(id.clone(), state.text.clone());
            }
        });
    }

    egui::Grid::new("transform_grid").num_columns(2).show(ui, |ui| {
        ui.label("Rotation");
        let rotation = ui.add(egui::DragValue::new(&mut state.angle).speed(1.0).suffix("°"));
        ui.end_row();
        ui.label("Scale X");
        let scale_x = ui.add(egui::DragValue::new(&mut state.scale_x).speed(0.01));
        ui.end_row();
        ui.label("Scale Y");
        let scale_y = ui.add(egui::DragValue::new(&mut state.scale_y).speed(0.01));
        ui.end_row();

        if settled(&rotation) || settled(&scale_x) || settled(&scale_y) {
            action = PropertiesAction::SetTransform {
                id: id.clone(),
                angle: state.angle,
                scale_x: state.scale_x,
                scale_y: state.scale_y,
            };
        }
    });

    ui.separator();
    if ui.button("🗑 Delete").clicked() {
        action = PropertiesAction::Delete(id);
    }

    action
}
