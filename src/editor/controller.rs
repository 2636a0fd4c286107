// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tool mode controller.
//!
//! Routes pointer, wheel and keyboard input to the behaviour of the
//! current tool, and commits every finished user action to the history
//! as exactly one snapshot. Multi-event gestures (pan, resize, move,
//! vertex drag, free-draw) are explicit session state spanning
//! pointer-down to pointer-up.
//!
//! The live scene always equals the current history snapshot except
//! while a gesture is in flight. Cancelling a gesture rebuilds the
//! scene from the snapshot.

use crate::config::EditorConfig;
use crate::editor::bridge::{self, localize};
use crate::editor::deferred::DeferredTask;
use crate::editor::history::History;
use crate::editor::polygon::{DraftOutcome, PolygonEditor, VertexRemoval};
use crate::editor::scene::{LiveShape, Primitive, Scene, POINT_RADIUS};
use crate::editor::viewport::Viewport;
use crate::models::annotation::{Annotation, Point, ShapeId};
use crate::util::geometry::nearest_edge;
use std::time::Instant;

/// Default content and size of a new text annotation.
const DEFAULT_TEXT: &str = "Text";
const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Screen tolerance for clicking thin shapes (freehand strokes).
const HIT_TOLERANCE_PX: f64 = 4.0;

/// Current interaction behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolMode {
    Select,
    Pan,
    Rectangle,
    Circle,
    PolygonDraw,
    Freehand,
    Point,
    Text,
    AddVertex,
    DeleteVertex,
}

impl ToolMode {
    pub const ALL: [ToolMode; 10] = [
        ToolMode::Select,
        ToolMode::Pan,
        ToolMode::Rectangle,
        ToolMode::Circle,
        ToolMode::PolygonDraw,
        ToolMode::Freehand,
        ToolMode::Point,
        ToolMode::Text,
        ToolMode::AddVertex,
        ToolMode::DeleteVertex,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ToolMode::Select => "Select",
            ToolMode::Pan => "Pan",
            ToolMode::Rectangle => "Rectangle",
            ToolMode::Circle => "Circle",
            ToolMode::PolygonDraw => "Polygon",
            ToolMode::Freehand => "Freehand",
            ToolMode::Point => "Point",
            ToolMode::Text => "Text",
            ToolMode::AddVertex => "Add vertex",
            ToolMode::DeleteVertex => "Delete vertex",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            ToolMode::Select => "Click a shape to select it, click a polygon to edit its vertices",
            ToolMode::Pan => "Drag to pan the view",
            ToolMode::Rectangle => "Drag to draw a rectangle",
            ToolMode::Circle => "Drag from the centre to draw a circle",
            ToolMode::PolygonDraw => {
                "Click to add vertices, click the first vertex or double-click to close"
            }
            ToolMode::Freehand => "Drag to draw a freehand stroke",
            ToolMode::Point => "Click to place a point",
            ToolMode::Text => "Click to place a text label",
            ToolMode::AddVertex => "Click near a polygon edge to insert a vertex",
            ToolMode::DeleteVertex => "Click a polygon vertex to delete it",
        }
    }

    /// Modes in which a polygon may stay in vertex-editing state.
    fn keeps_active_polygon(&self) -> bool {
        matches!(
            self,
            ToolMode::Select | ToolMode::PolygonDraw | ToolMode::AddVertex | ToolMode::DeleteVertex
        )
    }
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Escape,
    Enter,
    Delete,
}

/// In-flight pointer gesture.
#[derive(Debug, Clone, PartialEq)]
enum DragSession {
    Idle,
    /// Last pointer position in screen space.
    Pan { last: Point },
    /// Shape being sized from its world-space anchor.
    Resize { id: ShapeId, anchor: Point },
    /// Whole-shape move; `last` is the previous world pointer.
    Move { id: ShapeId, last: Point },
    Vertex {
        polygon: ShapeId,
        index: usize,
        last: Point,
    },
    Stroke,
}

/// Mutable interaction state owned by the controller.
#[derive(Debug, Clone)]
pub struct EditorSession {
    mode: ToolMode,
    drag: DragSession,
    polygons: PolygonEditor,
    selection: Vec<ShapeId>,
    pending_commit: DeferredTask,
}

impl EditorSession {
    fn new(config: &EditorConfig) -> Self {
        Self {
            mode: ToolMode::Select,
            drag: DragSession::Idle,
            polygons: PolygonEditor::new(),
            selection: Vec::new(),
            pending_commit: DeferredTask::new(config.commit_delay()),
        }
    }
}

/// The editing engine: live scene, history and interaction session.
#[derive(Debug, Clone)]
pub struct Editor {
    scene: Scene,
    history: History,
    session: EditorSession,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scene: Scene::new(Viewport::default()),
            history: History::with_limit(config.history_limit),
            session: EditorSession::new(&config),
            config,
        }
    }

    // Accessors

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.scene.viewport
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The current annotation set (the history snapshot under the cursor).
    pub fn annotations(&self) -> &[Annotation] {
        self.history.current()
    }

    pub fn mode(&self) -> ToolMode {
        self.session.mode
    }

    pub fn selection(&self) -> &[ShapeId] {
        &self.session.selection
    }

    pub fn polygon_editor(&self) -> &PolygonEditor {
        &self.session.polygons
    }

    pub fn active_polygon(&self) -> Option<&ShapeId> {
        self.session.polygons.active()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether a gesture or debounced commit is in flight.
    pub fn is_busy(&self) -> bool {
        self.session.drag != DragSession::Idle || self.session.pending_commit.is_pending()
    }

    /// Time until the debounced commit fires, for scheduling a repaint.
    pub fn pending_commit_in(&self, now: Instant) -> Option<std::time::Duration> {
        self.session.pending_commit.remaining(now)
    }

    // Mode switching

    /// Switch tool. Discards any draft or in-flight gesture and recomputes
    /// which shapes react to the pointer.
    pub fn set_mode(&mut self, mode: ToolMode) {
        self.cancel_gesture();
        self.session.polygons.cancel_draft(&mut self.scene);
        if !mode.keeps_active_polygon() {
            self.session.polygons.deactivate(&mut self.scene);
        }
        self.scene.end_text_edit();
        if mode != self.session.mode {
            log::debug!("Tool mode {:?} -> {:?}", self.session.mode, mode);
        }
        self.session.mode = mode;
        self.apply_interactivity();
    }

    // Pointer input. Positions are screen pixels relative to the canvas.

    pub fn pointer_down(&mut self, screen: Point, _now: Instant) {
        let world = self.scene.pointer_to_world(screen);
        match self.session.mode {
            ToolMode::Select => self.select_at(world),
            ToolMode::Pan => self.session.drag = DragSession::Pan { last: screen },
            ToolMode::Rectangle => self.begin_resize(
                world,
                Primitive::Rect {
                    width: 0.0,
                    height: 0.0,
                },
            ),
            ToolMode::Circle => self.begin_resize(world, Primitive::Circle { radius: 0.0 }),
            ToolMode::Freehand => {
                self.scene.begin_stroke(world);
                self.session.drag = DragSession::Stroke;
            }
            ToolMode::Point => {
                let id = self.add_shape(
                    world,
                    Primitive::Dot {
                        radius: POINT_RADIUS,
                    },
                );
                self.session.selection = vec![id];
                self.commit("Added point");
            }
            ToolMode::Text => {
                let id = self.add_shape(
                    world,
                    Primitive::Text {
                        content: DEFAULT_TEXT.to_string(),
                        font_size: DEFAULT_FONT_SIZE,
                    },
                );
                self.session.selection = vec![id.clone()];
                self.commit("Added text");
                self.scene.begin_text_edit(id);
            }
            ToolMode::PolygonDraw => {
                let close = self.px(self.config.close_radius_px);
                let duplicate = self.px(self.config.duplicate_click_px);
                let outcome =
                    self.session
                        .polygons
                        .add_draft_point(&mut self.scene, world, close, duplicate);
                if let DraftOutcome::Closed(id) = outcome {
                    self.polygon_finished(id);
                }
            }
            ToolMode::AddVertex => self.add_vertex_at(world),
            ToolMode::DeleteVertex => self.delete_vertex_at(world),
        }
    }

    pub fn pointer_move(&mut self, screen: Point, now: Instant) {
        let world = self.scene.pointer_to_world(screen);
        match &mut self.session.drag {
            DragSession::Idle => {}
            DragSession::Pan { last } => {
                let delta = screen - *last;
                *last = screen;
                self.scene.viewport.pan_by(delta.x, delta.y);
                self.scene.request_redraw();
            }
            DragSession::Resize { id, anchor } => {
                let anchor = *anchor;
                if let Some(shape) = self.scene.get_mut(id) {
                    let delta = world - anchor;
                    match &mut shape.primitive {
                        Primitive::Rect { width, height } => {
                            *width = delta.x.abs();
                            *height = delta.y.abs();
                            shape.transform.left = anchor.x.min(world.x);
                            shape.transform.top = anchor.y.min(world.y);
                        }
                        Primitive::Circle { radius } => *radius = delta.length(),
                        _ => {}
                    }
                }
                self.scene.request_redraw();
            }
            DragSession::Move { id, last } => {
                if *last == world {
                    return;
                }
                let delta = world - *last;
                *last = world;
                if let Some(shape) = self.scene.get_mut(id) {
                    shape.transform.left += delta.x;
                    shape.transform.top += delta.y;
                }
                self.scene.request_redraw();
                self.session.pending_commit.schedule(now);
            }
            DragSession::Vertex { index, last, .. } => {
                if *last == world {
                    return;
                }
                *last = world;
                let index = *index;
                if self
                    .session
                    .polygons
                    .drag_vertex(&mut self.scene, index, world)
                {
                    self.session.pending_commit.schedule(now);
                }
            }
            DragSession::Stroke => self.scene.extend_stroke(world),
        }
    }

    pub fn pointer_up(&mut self, screen: Point, now: Instant) {
        self.pointer_move(screen, now);
        match std::mem::replace(&mut self.session.drag, DragSession::Idle) {
            DragSession::Idle => {}
            DragSession::Pan { .. } => log::debug!("Pan finished"),
            DragSession::Resize { id, .. } => self.finish_resize(id),
            DragSession::Move { .. } | DragSession::Vertex { .. } => {
                if self.session.pending_commit.take_pending() {
                    self.commit("Edited shape");
                }
            }
            DragSession::Stroke => {
                if let Some(path) = self.scene.end_stroke() {
                    self.path_completed(path);
                }
            }
        }
    }

    pub fn double_click(&mut self, screen: Point) {
        match self.session.mode {
            ToolMode::PolygonDraw => {
                if let Some(id) = self.session.polygons.finish_draft(&mut self.scene) {
                    self.polygon_finished(id);
                }
            }
            ToolMode::Select => {
                let world = self.scene.pointer_to_world(screen);
                let tolerance = self.px(HIT_TOLERANCE_PX);
                if let Some(shape) = self.scene.hit_test(world, tolerance) {
                    if matches!(shape.primitive, Primitive::Text { .. }) {
                        let id = shape.id.clone();
                        self.scene.begin_text_edit(id);
                    }
                }
            }
            _ => {}
        }
    }

    /// Fire the debounced commit once the pointer has been idle long enough.
    /// Returns true if a snapshot was appended.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.session.pending_commit.fire_if_due(now) {
            self.commit("Edited shape");
            return true;
        }
        false
    }

    pub fn key(&mut self, key: EditorKey) {
        match key {
            EditorKey::Escape => {
                self.cancel_gesture();
                self.session.polygons.cancel_draft(&mut self.scene);
                self.session.polygons.deactivate(&mut self.scene);
                self.session.selection.clear();
                self.scene.end_text_edit();
                self.apply_interactivity();
            }
            EditorKey::Enter => {
                if self.scene.text_editing().is_some() {
                    self.scene.end_text_edit();
                } else if self.session.mode == ToolMode::PolygonDraw {
                    if let Some(id) = self.session.polygons.finish_draft(&mut self.scene) {
                        self.polygon_finished(id);
                    }
                }
            }
            EditorKey::Delete => {
                self.delete_selection();
            }
        }
    }

    // Zoom. Available in every mode.

    pub fn wheel(&mut self, delta: f64, screen: Point) {
        let base = self.config.wheel_zoom_base;
        self.scene.viewport.zoom_by_wheel(delta, base, screen);
        self.scene.request_redraw();
    }

    pub fn zoom_in(&mut self) {
        self.scene.viewport.zoom_in(self.config.button_zoom_step);
        self.scene.request_redraw();
    }

    pub fn zoom_out(&mut self) {
        self.scene.viewport.zoom_out(self.config.button_zoom_step);
        self.scene.request_redraw();
    }

    pub fn reset_view(&mut self) {
        self.scene.viewport.reset();
        self.scene.request_redraw();
    }

    // History

    pub fn undo(&mut self) -> bool {
        self.flush_pending();
        self.cancel_gesture();
        self.session.polygons.deactivate(&mut self.scene);
        if !self.history.undo() {
            return false;
        }
        self.rebuild_scene();
        log::info!("Undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending();
        self.cancel_gesture();
        self.session.polygons.deactivate(&mut self.scene);
        if !self.history.redo() {
            return false;
        }
        self.rebuild_scene();
        log::info!("Redo");
        true
    }

    /// Replace everything with a loaded annotation set, starting a fresh
    /// history from it.
    pub fn load(&mut self, annotations: &[Annotation]) {
        self.session.pending_commit.cancel();
        self.session.drag = DragSession::Idle;
        self.scene.cancel_stroke();
        self.session.polygons.cancel_draft(&mut self.scene);
        self.session.polygons.deactivate(&mut self.scene);
        self.session.selection.clear();
        bridge::restore(&mut self.scene, annotations);
        self.history.reset(&bridge::snapshot(&self.scene));
        self.apply_interactivity();
        log::info!("Loaded {} annotations", self.scene.len());
    }

    // Edits coming from the list panel / labeling UI

    pub fn set_selection(&mut self, ids: Vec<ShapeId>) {
        self.session.selection = ids
            .into_iter()
            .filter(|id| self.scene.contains(id))
            .collect();
    }

    /// Select a single shape; polygons also enter vertex editing when the
    /// current mode allows it.
    pub fn select(&mut self, id: &ShapeId) {
        let Some(is_polygon) = self.scene.get(id).map(LiveShape::is_polygon) else {
            return;
        };
        if is_polygon && self.session.mode.keeps_active_polygon() {
            self.session.polygons.activate(&mut self.scene, id);
        } else {
            self.session.polygons.deactivate(&mut self.scene);
        }
        self.session.selection = vec![id.clone()];
        self.apply_interactivity();
    }

    /// Set (or clear, with `None` or an empty string) the label of shapes.
    /// Returns the number of shapes changed.
    pub fn assign_label(&mut self, ids: &[ShapeId], label: Option<&str>) -> usize {
        self.flush_pending();
        let label = label.map(str::trim).filter(|l| !l.is_empty()).map(String::from);
        let mut changed = 0;
        for id in ids {
            if let Some(shape) = self.scene.get_mut(id) {
                if shape.label != label {
                    shape.label = label.clone();
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.scene.request_redraw();
            self.commit("Assigned label");
        }
        changed
    }

    /// Delete shapes. Returns the number removed.
    pub fn delete_shapes(&mut self, ids: &[ShapeId]) -> usize {
        self.flush_pending();
        let mut removed = 0;
        for id in ids {
            if self.session.polygons.is_active(id) {
                self.session.polygons.deactivate(&mut self.scene);
            }
            if self.scene.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            self.session.selection.retain(|id| !ids.contains(id));
            self.commit("Deleted shapes");
        }
        removed
    }

    /// Delete the selected shapes and the active polygon.
    pub fn delete_selection(&mut self) -> usize {
        let mut ids = self.session.selection.clone();
        if let Some(active) = self.session.polygons.active() {
            if !ids.contains(active) {
                ids.push(active.clone());
            }
        }
        self.delete_shapes(&ids)
    }

    /// Replace the content of a text shape.
    pub fn set_text(&mut self, id: &ShapeId, text: &str) -> bool {
        self.flush_pending();
        let Some(shape) = self.scene.get_mut(id) else {
            return false;
        };
        let Primitive::Text { content, .. } = &mut shape.primitive else {
            return false;
        };
        if content.as_str() == text {
            self.scene.end_text_edit();
            return false;
        }
        *content = text.to_string();
        self.scene.end_text_edit();
        self.scene.request_redraw();
        self.commit("Edited text");
        true
    }

    /// Rotate/scale a shape. Zero or non-finite scales are refused, as is a
    /// polygon whose vertices are being edited.
    pub fn set_transform(&mut self, id: &ShapeId, angle: f64, scale_x: f64, scale_y: f64) -> bool {
        let finite = angle.is_finite() && scale_x.is_finite() && scale_y.is_finite();
        if !finite || scale_x == 0.0 || scale_y == 0.0 {
            log::warn!("Refusing degenerate transform for {}", id);
            return false;
        }
        self.flush_pending();
        let Some(shape) = self.scene.get_mut(id) else {
            return false;
        };
        if shape.interactivity.locked {
            log::debug!("Shape {} is locked for vertex editing", id);
            return false;
        }
        let t = &mut shape.transform;
        if t.angle == angle && t.scale_x == scale_x && t.scale_y == scale_y {
            return false;
        }
        t.angle = angle;
        t.scale_x = scale_x;
        t.scale_y = scale_y;
        self.scene.request_redraw();
        self.commit("Transformed shape");
        true
    }

    // Internals

    /// Screen pixels to world units at the current zoom.
    fn px(&self, pixels: f64) -> f64 {
        self.scene.viewport.screen_to_world_distance(pixels)
    }

    fn commit(&mut self, action: &str) {
        let annotations = bridge::snapshot(&self.scene);
        self.history.append(&annotations);
        log::info!("{}, {} annotations", action, annotations.len());
    }

    /// Commit a pending debounced edit right away.
    fn flush_pending(&mut self) {
        if self.session.pending_commit.take_pending() {
            self.commit("Edited shape");
        }
    }

    /// Drop an in-flight gesture without committing it.
    fn cancel_gesture(&mut self) {
        let drag = std::mem::replace(&mut self.session.drag, DragSession::Idle);
        let pending = self.session.pending_commit.take_pending();
        self.scene.cancel_stroke();
        if drag != DragSession::Idle || pending {
            log::debug!("Cancelled gesture {:?}", drag);
            let active = self.session.polygons.active().cloned();
            self.rebuild_scene();
            if let Some(id) = active {
                self.session.polygons.activate(&mut self.scene, &id);
                self.apply_interactivity();
            }
        }
    }

    /// Rebuild the live scene from the current snapshot. Any active
    /// polygon is dropped.
    fn rebuild_scene(&mut self) {
        self.session.polygons.deactivate(&mut self.scene);
        bridge::restore(&mut self.scene, self.history.current());
        let scene = &self.scene;
        self.session.selection.retain(|id| scene.contains(id));
        self.apply_interactivity();
    }

    /// Recompute pointer interactivity for the current mode.
    fn apply_interactivity(&mut self) {
        let mode = self.session.mode;
        for shape in self.scene.shapes_mut() {
            let polygon = shape.is_polygon();
            let i = &mut shape.interactivity;
            i.evented = match mode {
                ToolMode::Select => true,
                ToolMode::AddVertex | ToolMode::DeleteVertex => polygon,
                _ => false,
            };
            i.selectable = mode == ToolMode::Select;
            // Polygons are never dragged as a whole; they open vertex editing.
            i.movable = mode == ToolMode::Select && !polygon && !i.locked;
        }
        self.scene.request_redraw();
    }

    fn add_shape(&mut self, origin: Point, primitive: Primitive) -> ShapeId {
        let id = ShapeId::generate();
        self.scene.add(LiveShape::new(id.clone(), origin, primitive));
        self.apply_interactivity();
        id
    }

    fn select_at(&mut self, world: Point) {
        let radius = self.px(self.config.handle_radius_px);
        if let (Some(polygon), Some(index)) = (
            self.session.polygons.active().cloned(),
            self.session.polygons.handle_at(world, radius),
        ) {
            log::debug!("Dragging vertex {} of polygon {}", index, polygon);
            self.session.drag = DragSession::Vertex {
                polygon,
                index,
                last: world,
            };
            return;
        }

        let tolerance = self.px(HIT_TOLERANCE_PX);
        let hit = self
            .scene
            .hit_test(world, tolerance)
            .map(|s| (s.id.clone(), s.is_polygon(), s.interactivity.movable));
        match hit {
            Some((id, true, _)) => {
                self.session.polygons.activate(&mut self.scene, &id);
                self.session.selection = vec![id];
                self.apply_interactivity();
            }
            Some((id, false, movable)) => {
                self.session.polygons.deactivate(&mut self.scene);
                self.session.selection = vec![id.clone()];
                self.apply_interactivity();
                if movable {
                    self.session.drag = DragSession::Move { id, last: world };
                }
            }
            None => {
                self.session.polygons.deactivate(&mut self.scene);
                self.session.selection.clear();
                self.apply_interactivity();
            }
        }
    }

    fn begin_resize(&mut self, world: Point, primitive: Primitive) {
        let id = self.add_shape(world, primitive);
        self.session.drag = DragSession::Resize { id, anchor: world };
    }

    fn finish_resize(&mut self, id: ShapeId) {
        let degenerate = match self.scene.get(&id).map(|s| &s.primitive) {
            Some(Primitive::Rect { width, height }) => *width == 0.0 || *height == 0.0,
            Some(Primitive::Circle { radius }) => *radius == 0.0,
            _ => true,
        };
        if degenerate {
            // A click without a drag leaves nothing behind.
            self.scene.remove(&id);
            log::debug!("Discarded zero-size shape {}", id);
            return;
        }
        self.session.selection = vec![id];
        self.commit("Added shape");
    }

    fn path_completed(&mut self, world_path: Vec<Point>) {
        let Some((origin, path)) = localize(&world_path) else {
            return;
        };
        let id = self.add_shape(origin, Primitive::Path { points: path });
        log::debug!("Freehand stroke tagged {}", id);
        self.commit("Added freehand stroke");
    }

    fn polygon_finished(&mut self, id: ShapeId) {
        self.session.selection = vec![id];
        self.apply_interactivity();
        self.commit("Added polygon");
    }

    /// Polygon whose nearest edge is closest to `world`: the active one if
    /// any, otherwise searched over every polygon.
    /// The active polygon when the click is within reach of one of its
    /// edges, otherwise whichever polygon has the nearest edge.
    fn polygon_near(&self, world: Point, threshold: f64) -> Option<ShapeId> {
        let edge_distance =
            |shape: &LiveShape| Some(nearest_edge(&shape.world_points()?, world)?.distance);
        if let Some(active) = self.session.polygons.active() {
            if self
                .scene
                .get(active)
                .and_then(edge_distance)
                .is_some_and(|d| d <= threshold)
            {
                return Some(active.clone());
            }
        }
        self.scene
            .shapes()
            .iter()
            .rev()
            .filter_map(|s| Some((s.id.clone(), edge_distance(s)?)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn add_vertex_at(&mut self, world: Point) {
        let threshold = self.px(self.config.insert_threshold_px);
        let Some(id) = self.polygon_near(world, threshold) else {
            return;
        };
        if !self
            .session
            .polygons
            .insert_vertex(&mut self.scene, &id, world, threshold)
        {
            return;
        }
        self.commit("Inserted vertex");
        self.session.polygons.activate(&mut self.scene, &id);
        self.session.selection = vec![id];
        self.set_mode(ToolMode::Select);
    }

    fn delete_vertex_at(&mut self, world: Point) {
        let radius = self.px(self.config.handle_radius_px);
        let Some((id, index)) = self.session.polygons.vertex_at(&self.scene, world, radius) else {
            return;
        };
        match self
            .session
            .polygons
            .remove_vertex(&mut self.scene, &id, index)
        {
            VertexRemoval::NotFound => return,
            VertexRemoval::Removed => {
                self.commit("Removed vertex");
                self.session.polygons.activate(&mut self.scene, &id);
            }
            VertexRemoval::PolygonDeleted => {
                self.session.selection.retain(|s| s != &id);
                self.commit("Deleted collapsed polygon");
            }
        }
        self.set_mode(ToolMode::Select);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Shape, ShapeKind};
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    fn click(editor: &mut Editor, x: f64, y: f64) {
        let now = Instant::now();
        editor.pointer_down(Point::new(x, y), now);
        editor.pointer_up(Point::new(x, y), now);
    }

    fn polygon_points(editor: &Editor) -> Vec<Point> {
        editor
            .annotations()
            .iter()
            .find_map(|a| match &a.shape {
                Shape::Polygon { points } => Some(points.clone()),
                _ => None,
            })
            .unwrap()
    }

    /// Draws the (100,100) (200,100) (200,200) triangle and closes it.
    fn draw_triangle(editor: &mut Editor) -> ShapeId {
        editor.set_mode(ToolMode::PolygonDraw);
        click(editor, 100.0, 100.0);
        click(editor, 200.0, 100.0);
        click(editor, 200.0, 200.0);
        click(editor, 105.0, 103.0);
        editor.annotations().last().unwrap().id.clone()
    }

    #[test]
    fn test_polygon_draw_scenario() {
        let mut editor = Editor::default();
        let id = draw_triangle(&mut editor);

        assert_eq!(editor.annotations().len(), 1);
        let polygon = &editor.annotations()[0];
        assert_eq!(polygon.position, Point::new(100.0, 100.0));
        assert_eq!(
            polygon_points(&editor),
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
        );
        assert_eq!(editor.active_polygon(), Some(&id));
        assert_eq!(editor.polygon_editor().handles().len(), 3);
        assert!(editor.polygon_editor().draft_points().is_empty());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_double_click_finishes_polygon() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::PolygonDraw);
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 50.0, 0.0);
        click(&mut editor, 50.0, 50.0);
        // second click of the double-click lands on the same spot
        click(&mut editor, 50.0, 50.0);
        editor.double_click(Point::new(50.0, 50.0));

        assert_eq!(polygon_points(&editor).len(), 3);
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_close_radius_scales_with_zoom() {
        let mut editor = Editor::default();
        editor.scene_mut().viewport.zoom_at(2.0, Point::ORIGIN);
        editor.set_mode(ToolMode::PolygonDraw);
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 200.0, 0.0);
        click(&mut editor, 200.0, 200.0);
        // 10px on screen is 5 world units, inside the 12px radius
        click(&mut editor, 10.0, 0.0);
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.annotations()[0].position, Point::new(0.0, 0.0));
        assert_eq!(
            polygon_points(&editor),
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
        );
    }

    #[test]
    fn test_insert_then_remove_vertex_restores_points() {
        let mut editor = Editor::default();
        let id = draw_triangle(&mut editor);
        editor.set_mode(ToolMode::Select);
        click(&mut editor, 500.0, 500.0);
        assert!(editor.active_polygon().is_none());

        // activate by clicking the polygon body
        click(&mut editor, 180.0, 120.0);
        assert_eq!(editor.active_polygon(), Some(&id));
        let before = polygon_points(&editor);

        editor.set_mode(ToolMode::AddVertex);
        click(&mut editor, 150.0, 100.0);
        assert_eq!(editor.mode(), ToolMode::Select);
        let inserted = polygon_points(&editor);
        assert_eq!(inserted.len(), 4);
        assert!(inserted[1].approx_eq(&Point::new(50.0, 0.0), EPS));
        assert_eq!(editor.polygon_editor().handles().len(), 4);

        editor.set_mode(ToolMode::DeleteVertex);
        click(&mut editor, 150.0, 100.0);
        assert_eq!(editor.mode(), ToolMode::Select);
        assert_eq!(polygon_points(&editor), before);
    }

    #[test]
    fn test_add_vertex_miss_keeps_mode() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        let snapshots = editor.history().len();

        editor.set_mode(ToolMode::AddVertex);
        click(&mut editor, 400.0, 400.0);
        assert_eq!(editor.mode(), ToolMode::AddVertex);
        assert_eq!(editor.history().len(), snapshots);

        editor.set_mode(ToolMode::DeleteVertex);
        click(&mut editor, 400.0, 400.0);
        assert_eq!(editor.mode(), ToolMode::DeleteVertex);
        assert_eq!(editor.history().len(), snapshots);
    }

    #[test]
    fn test_add_vertex_without_active_polygon() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        editor.key(EditorKey::Escape);
        assert!(editor.active_polygon().is_none());

        editor.set_mode(ToolMode::AddVertex);
        click(&mut editor, 200.0, 150.0);
        assert_eq!(polygon_points(&editor).len(), 4);
        assert!(editor.active_polygon().is_some());
    }

    #[test]
    fn test_add_vertex_reaches_inactive_polygon() {
        let mut editor = Editor::default();
        let first = draw_triangle(&mut editor);
        editor.set_mode(ToolMode::PolygonDraw);
        click(&mut editor, 300.0, 100.0);
        click(&mut editor, 400.0, 100.0);
        click(&mut editor, 400.0, 200.0);
        click(&mut editor, 305.0, 103.0);
        let second = editor.annotations().last().unwrap().id.clone();
        assert_eq!(editor.active_polygon(), Some(&second));

        // top edge of the first triangle, far from the active one
        editor.set_mode(ToolMode::AddVertex);
        click(&mut editor, 150.0, 100.0);
        assert_eq!(polygon_points(&editor).len(), 4);
        assert_eq!(editor.active_polygon(), Some(&first));
        assert_eq!(editor.mode(), ToolMode::Select);
    }

    #[test]
    fn test_delete_vertex_collapses_polygon() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        editor.set_mode(ToolMode::DeleteVertex);
        click(&mut editor, 200.0, 200.0);

        assert!(editor.annotations().is_empty());
        assert!(editor.active_polygon().is_none());
        assert_eq!(editor.mode(), ToolMode::Select);
        assert!(editor.undo());
        assert_eq!(polygon_points(&editor).len(), 3);
    }

    #[test]
    fn test_vertex_drag_commits_once() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        editor.set_mode(ToolMode::Select);
        let snapshots = editor.history().len();
        let t0 = Instant::now();

        editor.pointer_down(Point::new(200.0, 200.0), t0);
        for i in 1..=10 {
            editor.pointer_move(Point::new(200.0 + i as f64, 200.0 + 2.0 * i as f64), ms(t0, i * 16));
            assert!(!editor.tick(ms(t0, i * 16 + 10)));
        }
        assert_eq!(editor.history().len(), snapshots);
        editor.pointer_up(Point::new(210.0, 220.0), ms(t0, 170));

        assert_eq!(editor.history().len(), snapshots + 1);
        assert!(polygon_points(&editor)[2].approx_eq(&Point::new(110.0, 120.0), EPS));
        assert!(!editor.tick(ms(t0, 1000)));
        assert_eq!(editor.history().len(), snapshots + 1);
    }

    #[test]
    fn test_vertex_drag_debounce_fires_when_idle() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        editor.set_mode(ToolMode::Select);
        let snapshots = editor.history().len();
        let t0 = Instant::now();

        editor.pointer_down(Point::new(200.0, 100.0), t0);
        editor.pointer_move(Point::new(230.0, 90.0), ms(t0, 20));
        assert!(editor.tick(ms(t0, 200)));
        editor.pointer_up(Point::new(230.0, 90.0), ms(t0, 400));

        assert_eq!(editor.history().len(), snapshots + 1);
        assert!(polygon_points(&editor)[1].approx_eq(&Point::new(130.0, -10.0), EPS));
    }

    #[test]
    fn test_escape_discards_vertex_drag() {
        let mut editor = Editor::default();
        let id = draw_triangle(&mut editor);
        editor.set_mode(ToolMode::Select);
        let before = polygon_points(&editor);
        let snapshots = editor.history().len();
        let t0 = Instant::now();

        editor.pointer_down(Point::new(200.0, 200.0), t0);
        editor.pointer_move(Point::new(260.0, 260.0), ms(t0, 10));
        editor.key(EditorKey::Escape);
        assert!(!editor.tick(ms(t0, 1000)));

        assert_eq!(editor.history().len(), snapshots);
        assert_eq!(polygon_points(&editor), before);
        let live = editor.scene().get(&id).unwrap();
        assert_eq!(live.polygon_points().unwrap(), &before[..]);
    }

    #[test]
    fn test_mode_switch_cancels_draft() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::PolygonDraw);
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 30.0, 0.0);
        editor.set_mode(ToolMode::Rectangle);
        assert!(editor.polygon_editor().draft_points().is_empty());
        assert!(editor.annotations().is_empty());
    }

    #[test]
    fn test_rectangle_drag() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Rectangle);
        let t0 = Instant::now();
        editor.pointer_down(Point::new(10.0, 10.0), t0);
        editor.pointer_move(Point::new(25.0, 0.0), ms(t0, 10));
        editor.pointer_up(Point::new(40.0, -10.0), ms(t0, 20));

        assert_eq!(editor.annotations().len(), 1);
        let rect = &editor.annotations()[0];
        assert_eq!(rect.position, Point::new(10.0, -10.0));
        assert_eq!(
            rect.shape,
            Shape::Rectangle {
                width: 30.0,
                height: 20.0
            }
        );
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_click_without_drag_creates_nothing() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Circle);
        click(&mut editor, 10.0, 10.0);
        assert!(editor.annotations().is_empty());
        assert!(editor.scene().is_empty());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_circle_drag() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Circle);
        let t0 = Instant::now();
        editor.pointer_down(Point::new(50.0, 50.0), t0);
        editor.pointer_up(Point::new(53.0, 54.0), ms(t0, 30));

        let circle = &editor.annotations()[0];
        assert_eq!(circle.position, Point::new(50.0, 50.0));
        assert_eq!(circle.shape, Shape::Circle { radius: 5.0 });
    }

    #[test]
    fn test_point_and_text_commit_immediately() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Point);
        editor.pointer_down(Point::new(5.0, 6.0), Instant::now());
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.annotations()[0].kind(), ShapeKind::Point);

        editor.set_mode(ToolMode::Text);
        editor.pointer_down(Point::new(30.0, 40.0), Instant::now());
        assert_eq!(editor.annotations().len(), 2);
        let text_id = editor.annotations()[1].id.clone();
        assert_eq!(editor.scene().text_editing(), Some(&text_id));

        assert!(editor.set_text(&text_id, "truck"));
        assert!(editor.scene().text_editing().is_none());
        assert_eq!(
            editor.annotations()[1].shape,
            Shape::Text {
                text: "truck".to_string(),
                font_size: DEFAULT_FONT_SIZE
            }
        );
        assert_eq!(editor.history().len(), 4);
    }

    #[test]
    fn test_freehand_stroke() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Freehand);
        let t0 = Instant::now();
        editor.pointer_down(Point::new(10.0, 20.0), t0);
        editor.pointer_move(Point::new(15.0, 10.0), ms(t0, 10));
        editor.pointer_up(Point::new(30.0, 25.0), ms(t0, 20));

        assert_eq!(editor.annotations().len(), 1);
        let stroke = &editor.annotations()[0];
        assert_eq!(stroke.position, Point::new(10.0, 10.0));
        assert_eq!(
            stroke.shape,
            Shape::Freehand {
                path: vec![Point::new(0.0, 10.0), Point::new(5.0, 0.0), Point::new(20.0, 15.0)]
            }
        );
        assert!(editor.scene().stroke().is_none());
    }

    #[test]
    fn test_select_moves_non_polygon_only() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Point);
        editor.pointer_down(Point::new(300.0, 300.0), Instant::now());
        let point_id = editor.annotations()[0].id.clone();
        let polygon_id = draw_triangle(&mut editor);
        let polygon_position = editor
            .annotations()
            .iter()
            .find(|a| a.id == polygon_id)
            .unwrap()
            .position;

        editor.set_mode(ToolMode::Select);
        let t0 = Instant::now();
        editor.pointer_down(Point::new(301.0, 300.0), t0);
        editor.pointer_move(Point::new(311.0, 305.0), ms(t0, 10));
        editor.pointer_up(Point::new(321.0, 310.0), ms(t0, 20));
        assert_eq!(editor.selection(), &[point_id.clone()]);
        let point = editor.annotations().iter().find(|a| a.id == point_id).unwrap();
        assert!(point.position.approx_eq(&Point::new(320.0, 310.0), EPS));

        // dragging the polygon body activates it but never moves it
        editor.pointer_down(Point::new(180.0, 120.0), t0);
        editor.pointer_move(Point::new(240.0, 160.0), ms(t0, 10));
        editor.pointer_up(Point::new(240.0, 160.0), ms(t0, 20));
        assert_eq!(editor.active_polygon(), Some(&polygon_id));
        let polygon = editor.annotations().iter().find(|a| a.id == polygon_id).unwrap();
        assert_eq!(polygon.position, polygon_position);
    }

    #[test]
    fn test_drawing_mode_deactivates_polygon() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        editor.set_mode(ToolMode::AddVertex);
        assert!(editor.active_polygon().is_some());
        editor.set_mode(ToolMode::Rectangle);
        assert!(editor.active_polygon().is_none());
        assert!(editor.polygon_editor().handles().is_empty());
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Point);
        for i in 0..4 {
            editor.pointer_down(Point::new(10.0 * i as f64, 0.0), Instant::now());
        }
        draw_triangle(&mut editor);
        let final_set = editor.annotations().to_vec();

        for k in 1..=5 {
            for _ in 0..k {
                assert!(editor.undo());
            }
            assert_eq!(editor.annotations().len(), 5 - k);
            assert_eq!(editor.scene().len(), 5 - k);
            for _ in 0..k {
                assert!(editor.redo());
            }
            assert_eq!(editor.annotations(), &final_set[..]);
            assert_eq!(bridge::snapshot(editor.scene()), final_set);
        }
        assert!(!editor.redo());
    }

    #[test]
    fn test_edit_after_undo_drops_redo() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Point);
        editor.pointer_down(Point::new(1.0, 1.0), Instant::now());
        editor.pointer_down(Point::new(2.0, 2.0), Instant::now());
        editor.undo();
        editor.pointer_down(Point::new(3.0, 3.0), Instant::now());
        assert!(!editor.can_redo());
        assert_eq!(editor.annotations().len(), 2);
    }

    #[test]
    fn test_labels_and_delete() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Point);
        editor.pointer_down(Point::new(1.0, 1.0), Instant::now());
        editor.pointer_down(Point::new(50.0, 1.0), Instant::now());
        let ids: Vec<ShapeId> = editor.annotations().iter().map(|a| a.id.clone()).collect();

        assert_eq!(editor.assign_label(&ids, Some(" person ")), 2);
        assert!(editor
            .annotations()
            .iter()
            .all(|a| a.label.as_deref() == Some("person")));
        assert_eq!(editor.assign_label(&ids, Some("person")), 0);

        let snapshots = editor.history().len();
        assert_eq!(editor.delete_shapes(&ids[..1]), 1);
        assert_eq!(editor.history().len(), snapshots + 1);
        assert_eq!(editor.annotations().len(), 1);
        assert_eq!(editor.annotations()[0].id, ids[1]);
    }

    #[test]
    fn test_delete_key_removes_active_polygon() {
        let mut editor = Editor::default();
        draw_triangle(&mut editor);
        editor.set_mode(ToolMode::Select);
        editor.key(EditorKey::Delete);
        assert!(editor.annotations().is_empty());
        assert!(editor.active_polygon().is_none());
    }

    #[test]
    fn test_set_transform_rules() {
        let mut editor = Editor::default();
        let polygon = draw_triangle(&mut editor);
        assert!(!editor.set_transform(&polygon, 45.0, 1.0, 1.0));

        editor.key(EditorKey::Escape);
        assert!(!editor.set_transform(&polygon, 0.0, 0.0, 1.0));
        assert!(editor.set_transform(&polygon, 90.0, 2.0, 1.0));
        assert_eq!(editor.annotations()[0].rotation, 90.0);
        assert_eq!(editor.annotations()[0].scale_x, 2.0);
    }

    #[test]
    fn test_vertex_editing_on_transformed_polygon() {
        let mut editor = Editor::default();
        let id = draw_triangle(&mut editor);
        editor.key(EditorKey::Escape);
        // rotate so local +x points down the world +y axis
        assert!(editor.set_transform(&id, 90.0, 1.0, 1.0));

        editor.set_mode(ToolMode::Select);
        // vertex 1 (local (100,0)) now sits at world (100,200)
        click(&mut editor, 80.0, 180.0);
        assert_eq!(editor.active_polygon(), Some(&id));
        let handle = &editor.polygon_editor().handles()[1];
        assert!(handle.position.approx_eq(&Point::new(100.0, 200.0), 1e-7));

        let t0 = Instant::now();
        editor.pointer_down(Point::new(100.0, 200.0), t0);
        editor.pointer_up(Point::new(90.0, 220.0), ms(t0, 10));
        assert!(polygon_points(&editor)[1].approx_eq(&Point::new(120.0, 10.0), 1e-7));
    }

    #[test]
    fn test_pan_and_zoom() {
        let mut editor = Editor::default();
        editor.set_mode(ToolMode::Pan);
        let t0 = Instant::now();
        editor.pointer_down(Point::new(100.0, 100.0), t0);
        editor.pointer_move(Point::new(120.0, 90.0), ms(t0, 10));
        editor.pointer_up(Point::new(130.0, 80.0), ms(t0, 20));
        assert_eq!(editor.viewport().pan(), Point::new(30.0, -20.0));
        assert!(editor.annotations().is_empty());

        for _ in 0..100 {
            editor.wheel(-1000.0, Point::new(10.0, 10.0));
            let zoom = editor.viewport().zoom();
            assert!((0.1..=20.0).contains(&zoom));
        }
        for _ in 0..100 {
            editor.zoom_out();
            let zoom = editor.viewport().zoom();
            assert!((0.1..=20.0).contains(&zoom));
        }
        editor.zoom_in();
        assert!(editor.viewport().zoom() > 0.1);
    }

    #[test]
    fn test_load_resets_history_and_skips_degenerate() {
        let mut editor = Editor::default();
        let good = Annotation::new(Point::new(1.0, 1.0), Shape::Point);
        let bad = Annotation::new(
            Point::ORIGIN,
            Shape::Polygon {
                points: vec![Point::ORIGIN],
            },
        );
        editor.load(&[good.clone(), bad]);
        assert_eq!(editor.annotations(), &[good][..]);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_load_drops_repeated_ids() {
        let mut editor = Editor::default();
        let first = Annotation::new(Point::new(1.0, 1.0), Shape::Point);
        let mut copy = Annotation::new(Point::new(2.0, 2.0), Shape::Point);
        copy.id = first.id.clone();
        editor.load(&[first.clone(), copy]);
        assert_eq!(editor.annotations(), &[first.clone()][..]);

        editor.delete_shapes(&[first.id]);
        assert!(editor.annotations().is_empty());
    }
}
