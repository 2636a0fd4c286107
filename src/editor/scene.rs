// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Live scene: the shape objects the canvas renders and hit-tests.
//!
//! Live shapes carry the same information as annotations but in the
//! form the canvas works with (transform fields, interactivity flags,
//! a dirty marker for polygon geometry). The scene also owns the
//! viewport, the free-draw brush and the redraw request flag.

use crate::editor::viewport::Viewport;
use crate::models::annotation::{Point, ShapeId, ShapeKind, Style};
use crate::util::geometry::{distance_to_polyline, point_in_polygon};
use crate::util::transform::{to_local, to_world, Affine};

/// Fixed radius of point annotations, in local units.
pub const POINT_RADIUS: f64 = 5.0;

/// Approximate glyph width relative to the font size, for text hit boxes.
const TEXT_ADVANCE: f64 = 0.6;

/// Affine placement of a live shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTransform {
    pub left: f64,
    pub top: f64,
    /// Degrees.
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ShapeTransform {
    pub fn at(origin: Point) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn matrix(&self) -> Affine {
        Affine::compose(self.origin(), self.angle, self.scale_x, self.scale_y)
    }
}

/// Primitive geometry in the shape's local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect { width: f64, height: f64 },
    /// Centred on the local origin.
    Circle { radius: f64 },
    Polygon { points: Vec<Point> },
    /// Centred on the local origin.
    Dot { radius: f64 },
    Text { content: String, font_size: f64 },
    Path { points: Vec<Point> },
}

impl Primitive {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Primitive::Rect { .. } => ShapeKind::Rectangle,
            Primitive::Circle { .. } => ShapeKind::Circle,
            Primitive::Polygon { .. } => ShapeKind::Polygon,
            Primitive::Dot { .. } => ShapeKind::Point,
            Primitive::Text { .. } => ShapeKind::Text,
            Primitive::Path { .. } => ShapeKind::Freehand,
        }
    }

    /// Whether a local-space point lies on or inside the primitive.
    fn contains_local(&self, local: Point, tolerance: f64) -> bool {
        match self {
            Primitive::Rect { width, height } => {
                local.x >= -tolerance
                    && local.y >= -tolerance
                    && local.x <= width + tolerance
                    && local.y <= height + tolerance
            }
            Primitive::Circle { radius } | Primitive::Dot { radius } => {
                local.length() <= radius + tolerance
            }
            Primitive::Polygon { points } => point_in_polygon(points, local),
            Primitive::Text { content, font_size } => {
                let width = content.chars().count().max(1) as f64 * font_size * TEXT_ADVANCE;
                local.x >= -tolerance
                    && local.y >= -tolerance
                    && local.x <= width + tolerance
                    && local.y <= font_size + tolerance
            }
            Primitive::Path { points } => {
                distance_to_polyline(points, local).is_some_and(|d| d <= tolerance)
            }
        }
    }
}

/// Which pointer interactions the canvas allows on a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interactivity {
    /// Receives pointer hits at all.
    pub evented: bool,
    pub selectable: bool,
    /// Can be moved/resized as a whole.
    pub movable: bool,
    /// Whole-shape transform frozen while its vertices are being edited.
    pub locked: bool,
}

impl Default for Interactivity {
    fn default() -> Self {
        Self {
            evented: true,
            selectable: true,
            movable: true,
            locked: false,
        }
    }
}

/// A shape object on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveShape {
    pub id: ShapeId,
    pub transform: ShapeTransform,
    pub primitive: Primitive,
    pub style: Style,
    pub label: Option<String>,
    pub interactivity: Interactivity,
    /// Polygon geometry changed since it was last drawn.
    pub dirty: bool,
}

impl LiveShape {
    pub fn new(id: ShapeId, origin: Point, primitive: Primitive) -> Self {
        let style = Style::for_kind(primitive.kind());
        Self {
            id,
            transform: ShapeTransform::at(origin),
            primitive,
            style,
            label: None,
            interactivity: Interactivity::default(),
            dirty: false,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.primitive.kind()
    }

    pub fn matrix(&self) -> Affine {
        self.transform.matrix()
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.primitive, Primitive::Polygon { .. })
    }

    pub fn polygon_points(&self) -> Option<&[Point]> {
        match &self.primitive {
            Primitive::Polygon { points } => Some(points),
            _ => None,
        }
    }

    pub fn polygon_points_mut(&mut self) -> Option<&mut Vec<Point>> {
        match &mut self.primitive {
            Primitive::Polygon { points } => Some(points),
            _ => None,
        }
    }

    /// Polygon vertices mapped into world space.
    pub fn world_points(&self) -> Option<Vec<Point>> {
        let matrix = self.matrix();
        self.polygon_points()
            .map(|points| points.iter().map(|p| to_world(*p, &matrix)).collect())
    }

    /// Hit test against a world point with a world-space tolerance.
    pub fn contains(&self, world: Point, tolerance: f64) -> bool {
        let matrix = self.matrix();
        let local = to_local(world, &matrix);
        // Tolerance is a world distance; approximate it in local units.
        let scale = self.transform.scale_x.abs().max(self.transform.scale_y.abs());
        let local_tolerance = if scale > 0.0 { tolerance / scale } else { tolerance };
        self.primitive.contains_local(local, local_tolerance)
    }
}

/// The canvas model.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: Vec<LiveShape>,
    pub viewport: Viewport,
    redraw: bool,
    brush: Option<Vec<Point>>,
    text_editing: Option<ShapeId>,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    /// Shapes in paint order (last is on top).
    pub fn shapes(&self) -> &[LiveShape] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> impl Iterator<Item = &mut LiveShape> {
        self.shapes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn add(&mut self, shape: LiveShape) {
        self.shapes.push(shape);
        self.request_redraw();
    }

    pub fn remove(&mut self, id: &ShapeId) -> Option<LiveShape> {
        let index = self.shapes.iter().position(|s| &s.id == id)?;
        if self.text_editing.as_ref() == Some(id) {
            self.text_editing = None;
        }
        self.request_redraw();
        Some(self.shapes.remove(index))
    }

    pub fn get(&self, id: &ShapeId) -> Option<&LiveShape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    pub fn get_mut(&mut self, id: &ShapeId) -> Option<&mut LiveShape> {
        self.shapes.iter_mut().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Replace every shape, e.g. after undo/redo.
    pub fn replace_all(&mut self, shapes: Vec<LiveShape>) {
        self.shapes = shapes;
        if let Some(id) = &self.text_editing {
            if !self.shapes.iter().any(|s| &s.id == id) {
                self.text_editing = None;
            }
        }
        self.request_redraw();
    }

    /// Topmost evented shape under a world point.
    pub fn hit_test(&self, world: Point, tolerance: f64) -> Option<&LiveShape> {
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.interactivity.evented)
            .find(|s| s.contains(world, tolerance))
    }

    /// Pointer position (screen, canvas-relative) in world coordinates.
    pub fn pointer_to_world(&self, screen: Point) -> Point {
        self.viewport.to_world(screen)
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Returns and clears the redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    // Native free-draw brush

    pub fn begin_stroke(&mut self, world: Point) {
        self.brush = Some(vec![world]);
        self.request_redraw();
    }

    pub fn extend_stroke(&mut self, world: Point) {
        if let Some(points) = &mut self.brush {
            if points.last() != Some(&world) {
                points.push(world);
                self.redraw = true;
            }
        }
    }

    /// Finish the stroke. Returns the captured world-space path when it has
    /// at least two points.
    pub fn end_stroke(&mut self) -> Option<Vec<Point>> {
        let points = self.brush.take()?;
        self.request_redraw();
        (points.len() >= 2).then_some(points)
    }

    pub fn cancel_stroke(&mut self) {
        if self.brush.take().is_some() {
            self.request_redraw();
        }
    }

    /// In-progress stroke, for rendering.
    pub fn stroke(&self) -> Option<&[Point]> {
        self.brush.as_deref()
    }

    // Inline text editing

    pub fn begin_text_edit(&mut self, id: ShapeId) {
        self.text_editing = Some(id);
    }

    pub fn end_text_edit(&mut self) {
        self.text_editing = None;
    }

    pub fn text_editing(&self) -> Option<&ShapeId> {
        self.text_editing.as_ref()
    }
}
