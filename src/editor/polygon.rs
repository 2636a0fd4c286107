// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Polygon vertex editing.
//!
//! At most one polygon is active at a time. The active polygon has one
//! vertex handle per point and its whole-shape transform is locked, so
//! handle positions can always be derived from the current matrix.
//! Handles refer to their polygon by id and point index only.
//!
//! The editor also owns the draft buffer used while drawing a new
//! polygon click by click.
//!
//! Operations here mutate the scene only; committing the result to the
//! history is the caller's job.

use crate::editor::bridge::localize;
use crate::editor::scene::{LiveShape, Primitive, Scene};
use crate::models::annotation::{Point, ShapeId};
use crate::util::geometry::nearest_edge;
use crate::util::transform::{to_local, to_world};

/// Draggable marker for one polygon point. Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexHandle {
    pub polygon: ShapeId,
    pub index: usize,
    /// World position of the point.
    pub position: Point,
}

/// Result of removing a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexRemoval {
    /// The point was removed and the polygon kept.
    Removed,
    /// The polygon fell below three points and was deleted.
    PolygonDeleted,
    /// No such polygon or point.
    NotFound,
}

/// Result of a click while drawing a polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftOutcome {
    Added,
    /// Too close to the previous point (e.g. second click of a double-click).
    Ignored,
    /// The click closed the polygon, which was created and activated.
    Closed(ShapeId),
}

#[derive(Debug, Clone, Default)]
pub struct PolygonEditor {
    active: Option<ShapeId>,
    handles: Vec<VertexHandle>,
    /// World-space clicks of the polygon being drawn.
    draft: Vec<Point>,
}

impl PolygonEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ShapeId> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &ShapeId) -> bool {
        self.active.as_ref() == Some(id)
    }

    pub fn handles(&self) -> &[VertexHandle] {
        &self.handles
    }

    /// Open vertex editing on a polygon, closing it on any other.
    /// Returns false when `id` is not a polygon in the scene.
    pub fn activate(&mut self, scene: &mut Scene, id: &ShapeId) -> bool {
        if !scene.get(id).is_some_and(LiveShape::is_polygon) {
            return false;
        }
        if self.is_active(id) {
            self.sync_handles(scene);
            return true;
        }
        self.deactivate(scene);

        if let Some(shape) = scene.get_mut(id) {
            shape.interactivity.locked = true;
            shape.interactivity.movable = false;
        }
        self.active = Some(id.clone());
        self.sync_handles(scene);
        log::debug!("Activated polygon {} ({} handles)", id, self.handles.len());
        true
    }

    /// Close vertex editing, destroying the handles.
    pub fn deactivate(&mut self, scene: &mut Scene) {
        let Some(id) = self.active.take() else {
            return;
        };
        self.handles.clear();
        if let Some(shape) = scene.get_mut(&id) {
            shape.interactivity.locked = false;
        }
        scene.request_redraw();
        log::debug!("Deactivated polygon {}", id);
    }

    /// Rebuild handles from the active polygon's current points.
    pub fn sync_handles(&mut self, scene: &mut Scene) {
        self.handles.clear();
        let Some(id) = self.active.clone() else {
            return;
        };
        match scene.get(&id).and_then(LiveShape::world_points) {
            Some(world) => {
                self.handles = world
                    .into_iter()
                    .enumerate()
                    .map(|(index, position)| VertexHandle {
                        polygon: id.clone(),
                        index,
                        position,
                    })
                    .collect();
            }
            None => {
                // The polygon is gone from the scene.
                self.active = None;
            }
        }
        scene.request_redraw();
    }

    /// Index of the active polygon's handle nearest to `world`, within `radius`.
    pub fn handle_at(&self, world: Point, radius: f64) -> Option<usize> {
        self.handles
            .iter()
            .map(|h| (h.index, h.position.distance_to(&world)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Find a vertex near `world`: the active polygon's handles first, then
    /// the vertices of every other polygon, topmost first.
    pub fn vertex_at(&self, scene: &Scene, world: Point, radius: f64) -> Option<(ShapeId, usize)> {
        if let (Some(id), Some(index)) = (&self.active, self.handle_at(world, radius)) {
            return Some((id.clone(), index));
        }
        scene.shapes().iter().rev().find_map(|shape| {
            let points = shape.world_points()?;
            points
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.distance_to(&world)))
                .filter(|(_, d)| *d <= radius)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| (shape.id.clone(), i))
        })
    }

    /// Move a vertex of the active polygon to a world position.
    pub fn drag_vertex(&mut self, scene: &mut Scene, index: usize, world: Point) -> bool {
        let Some(id) = self.active.clone() else {
            return false;
        };
        let Some(shape) = scene.get_mut(&id) else {
            return false;
        };
        let local = to_local(world, &shape.matrix());
        let Some(point) = shape
            .polygon_points_mut()
            .and_then(|points| points.get_mut(index))
        else {
            return false;
        };
        *point = local;
        shape.dirty = true;

        let matrix = shape.matrix();
        if let Some(points) = shape.polygon_points() {
            for (handle, p) in self.handles.iter_mut().zip(points) {
                handle.position = to_world(*p, &matrix);
            }
        }
        scene.request_redraw();
        true
    }

    /// Insert a vertex on the edge nearest to `world` when it is within
    /// `threshold` (world units). Returns false and changes nothing otherwise.
    pub fn insert_vertex(
        &mut self,
        scene: &mut Scene,
        id: &ShapeId,
        world: Point,
        threshold: f64,
    ) -> bool {
        let Some(shape) = scene.get_mut(id) else {
            return false;
        };
        let Some(hit) = shape
            .world_points()
            .and_then(|points| nearest_edge(&points, world))
        else {
            return false;
        };
        if hit.distance > threshold {
            log::debug!(
                "Insert on polygon {} rejected: edge {} is {:.1} away",
                id,
                hit.index,
                hit.distance
            );
            return false;
        }
        let local = to_local(world, &shape.matrix());
        if let Some(points) = shape.polygon_points_mut() {
            points.insert(hit.index + 1, local);
        }
        shape.dirty = true;

        if self.is_active(id) {
            self.sync_handles(scene);
        } else {
            scene.request_redraw();
        }
        log::info!("Inserted vertex after index {} on polygon {}", hit.index, id);
        true
    }

    /// Remove a vertex. A polygon left with fewer than three points is
    /// deleted from the scene.
    pub fn remove_vertex(&mut self, scene: &mut Scene, id: &ShapeId, index: usize) -> VertexRemoval {
        let remaining = match scene.get_mut(id).and_then(LiveShape::polygon_points_mut) {
            Some(points) if index < points.len() => {
                points.remove(index);
                points.len()
            }
            _ => return VertexRemoval::NotFound,
        };

        if remaining < 3 {
            if self.is_active(id) {
                self.active = None;
                self.handles.clear();
            }
            scene.remove(id);
            log::info!("Polygon {} collapsed below 3 points and was deleted", id);
            return VertexRemoval::PolygonDeleted;
        }

        if let Some(shape) = scene.get_mut(id) {
            shape.dirty = true;
        }
        if self.is_active(id) {
            self.sync_handles(scene);
        } else {
            scene.request_redraw();
        }
        log::info!("Removed vertex {} from polygon {}", index, id);
        VertexRemoval::Removed
    }

    // Drawing

    pub fn draft_points(&self) -> &[Point] {
        &self.draft
    }

    pub fn is_drafting(&self) -> bool {
        !self.draft.is_empty()
    }

    /// Feed a click into the draft. A click within `close_radius` of the
    /// first point, once three points exist, finishes the polygon.
    pub fn add_draft_point(
        &mut self,
        scene: &mut Scene,
        world: Point,
        close_radius: f64,
        duplicate_radius: f64,
    ) -> DraftOutcome {
        if self.draft.len() >= 3 && world.distance_to(&self.draft[0]) <= close_radius {
            if let Some(id) = self.finish_draft(scene) {
                return DraftOutcome::Closed(id);
            }
        }
        if self
            .draft
            .last()
            .is_some_and(|last| last.distance_to(&world) <= duplicate_radius)
        {
            return DraftOutcome::Ignored;
        }
        self.draft.push(world);
        scene.request_redraw();
        DraftOutcome::Added
    }

    /// Turn the draft into a polygon, stored as a bounding-box origin plus
    /// local points, and activate it. Needs at least three points.
    pub fn finish_draft(&mut self, scene: &mut Scene) -> Option<ShapeId> {
        if self.draft.len() < 3 {
            return None;
        }
        let (origin, points) = localize(&self.draft)?;
        self.draft.clear();

        let id = ShapeId::generate();
        scene.add(LiveShape::new(id.clone(), origin, Primitive::Polygon { points }));
        log::info!("Finished polygon {} at ({:.1}, {:.1})", id, origin.x, origin.y);
        self.activate(scene, &id);
        Some(id)
    }

    /// Drop the draft and its markers.
    pub fn cancel_draft(&mut self, scene: &mut Scene) {
        if !self.draft.is_empty() {
            self.draft.clear();
            scene.request_redraw();
        }
    }
}
