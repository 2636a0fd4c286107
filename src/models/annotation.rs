// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the canonical annotation records: one closed
//! enum variant per shape kind, carrying the affine placement of the
//! shape's local frame, its style and an optional label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A 2D point. Whether it lives in world or local coordinates is decided
/// by whoever holds it; conversion goes through `util::transform`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    /// Length of the point treated as a vector from the origin.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    pub fn approx_eq(&self, other: &Point, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Opaque, immutable shape identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RGBA color, serialized as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color([r, g, b, a])
    }
}

/// Stroke and fill of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub stroke: Color,
    pub fill: Color,
    pub stroke_width: f64,
}

impl Style {
    /// Default style for a freshly created shape of the given kind.
    pub fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rectangle => Style {
                stroke: Color::rgba(255, 0, 0, 255),
                fill: Color::rgba(255, 0, 0, 40),
                stroke_width: 2.0,
            },
            ShapeKind::Circle => Style {
                stroke: Color::rgba(0, 0, 255, 255),
                fill: Color::rgba(0, 0, 255, 40),
                stroke_width: 2.0,
            },
            ShapeKind::Polygon => Style {
                stroke: Color::rgba(0, 200, 0, 255),
                fill: Color::rgba(0, 200, 0, 50),
                stroke_width: 2.0,
            },
            ShapeKind::Point => Style {
                stroke: Color::rgba(255, 255, 255, 255),
                fill: Color::rgba(255, 140, 0, 255),
                stroke_width: 1.0,
            },
            ShapeKind::Text => Style {
                stroke: Color::TRANSPARENT,
                fill: Color::rgba(255, 255, 0, 255),
                stroke_width: 0.0,
            },
            ShapeKind::Freehand => Style {
                stroke: Color::rgba(255, 0, 255, 255),
                fill: Color::TRANSPARENT,
                stroke_width: 3.0,
            },
        }
    }
}

/// Payload-free shape tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
    Point,
    Text,
    Freehand,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Point => "point",
            ShapeKind::Text => "text",
            ShapeKind::Freehand => "freehand",
        };
        f.write_str(name)
    }
}

/// Per-kind geometry, expressed in the shape's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle {
        width: f64,
        height: f64,
    },
    Circle {
        radius: f64,
    },
    /// Points are relative to the annotation's position.
    Polygon {
        points: Vec<Point>,
    },
    Point,
    Text {
        text: String,
        #[serde(rename = "fontSize")]
        font_size: f64,
    },
    Freehand {
        path: Vec<Point>,
    },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Point => ShapeKind::Point,
            Shape::Text { .. } => ShapeKind::Text,
            Shape::Freehand { .. } => ShapeKind::Freehand,
        }
    }

    fn approx_eq(&self, other: &Shape, eps: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= eps;
        let same_points = |a: &[Point], b: &[Point]| {
            a.len() == b.len() && a.iter().zip(b).all(|(p, q)| p.approx_eq(q, eps))
        };
        match (self, other) {
            (
                Shape::Rectangle { width, height },
                Shape::Rectangle {
                    width: w,
                    height: h,
                },
            ) => close(*width, *w) && close(*height, *h),
            (Shape::Circle { radius }, Shape::Circle { radius: r }) => close(*radius, *r),
            (Shape::Polygon { points }, Shape::Polygon { points: p }) => same_points(points, p),
            (Shape::Point, Shape::Point) => true,
            (
                Shape::Text { text, font_size },
                Shape::Text {
                    text: t,
                    font_size: s,
                },
            ) => text == t && close(*font_size, *s),
            (Shape::Freehand { path }, Shape::Freehand { path: p }) => same_points(path, p),
            _ => false,
        }
    }
}

/// A canonical annotation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: ShapeId,
    /// World-space origin of the local frame.
    pub position: Point,
    /// Rotation in degrees.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Annotation {
    /// Create an unrotated, unscaled annotation with a fresh id and the
    /// default style for its kind.
    pub fn new(position: Point, shape: Shape) -> Self {
        Self {
            id: ShapeId::generate(),
            position,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            style: Style::for_kind(shape.kind()),
            label: None,
            shape,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Number of vertices for polygons, `None` for every other kind.
    pub fn vertex_count(&self) -> Option<usize> {
        match &self.shape {
            Shape::Polygon { points } => Some(points.len()),
            _ => None,
        }
    }

    /// Field-by-field comparison with a floating point tolerance.
    pub fn approx_eq(&self, other: &Annotation, eps: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= eps;
        self.id == other.id
            && self.position.approx_eq(&other.position, eps)
            && close(self.rotation, other.rotation)
            && close(self.scale_x, other.scale_x)
            && close(self.scale_y, other.scale_y)
            && self.style.stroke == other.style.stroke
            && self.style.fill == other.style.fill
            && close(self.style.stroke_width, other.style.stroke_width)
            && self.label == other.label
            && self.shape.approx_eq(&other.shape, eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_json_layout() {
        let annotation = Annotation::new(
            Point::new(10.0, 20.0),
            Shape::Polygon {
                points: vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            },
        );
        let json = serde_json::to_value(&annotation).unwrap();

        assert_eq!(json["type"], "polygon");
        assert_eq!(json["scaleX"], 1.0);
        assert_eq!(json["points"].as_array().unwrap().len(), 3);
        assert!(json.get("label").is_none());

        let back: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, annotation);
    }

    #[test]
    fn test_text_font_size_field_name() {
        let annotation = Annotation::new(
            Point::new(1.0, 1.0),
            Shape::Text {
                text: "car".to_string(),
                font_size: 18.0,
            },
        );
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["fontSize"], 18.0);
        assert_eq!(json["text"], "car");
    }

    #[test]
    fn test_unit_point_variant_roundtrip() {
        let mut annotation = Annotation::new(Point::new(3.0, 4.0), Shape::Point);
        annotation.label = Some("eye".to_string());
        let json = serde_json::to_string(&annotation).unwrap();
        let back: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), ShapeKind::Point);
        assert_eq!(back.label.as_deref(), Some("eye"));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ShapeId::generate(), ShapeId::generate());
    }

    #[test]
    fn test_approx_eq_tolerates_rounding() {
        let a = Annotation::new(Point::new(1.0, 2.0), Shape::Circle { radius: 10.0 });
        let mut b = a.clone();
        b.position.x += 1e-9;
        assert!(a.approx_eq(&b, 1e-6));
        b.shape = Shape::Circle { radius: 11.0 };
        assert!(!a.approx_eq(&b, 1e-6));
    }
}
