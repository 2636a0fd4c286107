// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Distances, edge search and containment tests. Inputs must all share
//! one coordinate space; for hit-testing against rendered edges that is
//! world space.

use crate::models::annotation::Point;

/// Closest edge of a closed polygon to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    /// Index of the edge's first endpoint; the edge runs to `(index + 1) % n`.
    pub index: usize,
    pub distance: f64,
}

/// Distance from `p` to the segment `[a, b]`, projecting onto the
/// segment and clamping to its endpoints.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    if len_sq == 0.0 {
        return p.distance_to(&a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&(a + ab.scale(t)))
}

/// Find the polygon edge nearest to `point`, including the closing edge
/// from the last vertex back to the first.
pub fn nearest_edge(points: &[Point], point: Point) -> Option<EdgeHit> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    (0..n)
        .map(|i| EdgeHit {
            index: i,
            distance: point_to_segment_distance(point, points[i], points[(i + 1) % n]),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Distance from `point` to an open polyline.
pub fn distance_to_polyline(points: &[Point], point: Point) -> Option<f64> {
    match points {
        [] => None,
        [only] => Some(only.distance_to(&point)),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_distance(point, w[0], w[1]))
            .min_by(f64::total_cmp),
    }
}

/// Even-odd ray casting containment test.
pub fn point_in_polygon(points: &[Point], point: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Component-wise minimum of a point set.
pub fn bounding_min(points: &[Point]) -> Option<Point> {
    let first = *points.first()?;
    Some(points.iter().fold(first, |acc, p| Point {
        x: acc.x.min(p.x),
        y: acc.y.min(p.y),
    }))
}
