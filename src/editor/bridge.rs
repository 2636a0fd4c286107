// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Mapping between live scene shapes and canonical annotation records.
//!
//! `to_annotation(&to_live_shape(a))` reproduces `a` field for field,
//! including polygon point order and the local-coordinate layout.

use crate::editor::scene::{LiveShape, Primitive, Scene, ShapeTransform, POINT_RADIUS};
use crate::models::annotation::{Annotation, Point, Shape};
use std::collections::HashSet;

pub fn to_annotation(shape: &LiveShape) -> Annotation {
    let payload = match &shape.primitive {
        Primitive::Rect { width, height } => Shape::Rectangle {
            width: *width,
            height: *height,
        },
        Primitive::Circle { radius } => Shape::Circle { radius: *radius },
        Primitive::Polygon { points } => Shape::Polygon {
            points: points.clone(),
        },
        Primitive::Dot { .. } => Shape::Point,
        Primitive::Text { content, font_size } => Shape::Text {
            text: content.clone(),
            font_size: *font_size,
        },
        Primitive::Path { points } => Shape::Freehand {
            path: points.clone(),
        },
    };
    Annotation {
        id: shape.id.clone(),
        position: shape.transform.origin(),
        rotation: shape.transform.angle,
        scale_x: shape.transform.scale_x,
        scale_y: shape.transform.scale_y,
        style: shape.style,
        label: shape.label.clone(),
        shape: payload,
    }
}

pub fn to_live_shape(annotation: &Annotation) -> LiveShape {
    let primitive = match &annotation.shape {
        Shape::Rectangle { width, height } => Primitive::Rect {
            width: *width,
            height: *height,
        },
        Shape::Circle { radius } => Primitive::Circle { radius: *radius },
        Shape::Polygon { points } => Primitive::Polygon {
            points: points.clone(),
        },
        Shape::Point => Primitive::Dot {
            radius: POINT_RADIUS,
        },
        Shape::Text { text, font_size } => Primitive::Text {
            content: text.clone(),
            font_size: *font_size,
        },
        Shape::Freehand { path } => Primitive::Path {
            points: path.clone(),
        },
    };
    let mut shape = LiveShape::new(annotation.id.clone(), annotation.position, primitive);
    shape.transform = ShapeTransform {
        left: annotation.position.x,
        top: annotation.position.y,
        angle: annotation.rotation,
        scale_x: annotation.scale_x,
        scale_y: annotation.scale_y,
    };
    shape.style = annotation.style;
    shape.label = annotation.label.clone();
    shape
}

/// Serialize the whole scene in paint order.
pub fn snapshot(scene: &Scene) -> Vec<Annotation> {
    scene.shapes().iter().map(to_annotation).collect()
}

/// Rebuild the scene's shapes from an annotation set. Polygons with
/// fewer than three points are dropped, as is any record reusing an id
/// already seen.
pub fn restore(scene: &mut Scene, annotations: &[Annotation]) {
    let mut seen = HashSet::new();
    let shapes = annotations
        .iter()
        .filter(|a| match a.vertex_count() {
            Some(n) if n < 3 => {
                log::warn!("Skipping degenerate polygon {} with {} points", a.id, n);
                false
            }
            _ => true,
        })
        .filter(|a| {
            let fresh = seen.insert(&a.id);
            if !fresh {
                log::warn!("Skipping {} with duplicate id {}", a.kind(), a.id);
            }
            fresh
        })
        .map(to_live_shape)
        .collect();
    scene.replace_all(shapes);
}

/// Normalise world-space vertices into a position plus local points.
pub fn localize(world_points: &[Point]) -> Option<(Point, Vec<Point>)> {
    let origin = crate::util::geometry::bounding_min(world_points)?;
    Some((origin, world_points.iter().map(|p| *p - origin).collect()))
}
