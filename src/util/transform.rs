// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Affine transforms between local and world coordinates.
//!
//! Every conversion between a shape's local frame and the world (and
//! between the world and the screen) goes through this module. Matrices
//! use the 2x3 layout
//!
//! ```text
//! | a c e |
//! | b d f |
//! ```
//!
//! so that `x' = a*x + c*y + e` and `y' = b*x + d*y + f`.

use crate::models::annotation::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Affine {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Affine {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate_degrees(angle: f64) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        Affine {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Compose a shape's placement: scale first, then rotate, then
    /// translate to `position`.
    pub fn compose(position: Point, rotation: f64, scale_x: f64, scale_y: f64) -> Self {
        Self::translate(position.x, position.y)
            .multiply(&Self::rotate_degrees(rotation))
            .multiply(&Self::scale(scale_x, scale_y))
    }

    /// Matrix product `self * other`: `other` is applied first.
    pub fn multiply(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the matrix is degenerate
    /// (a zero scale on either axis).
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Inverse transform, falling back to identity for a degenerate matrix
    /// so that callers never see NaN geometry.
    pub fn invert_or_identity(&self) -> Affine {
        self.invert().unwrap_or_else(|| {
            log::warn!("Degenerate transform {:?}, using identity for inversion", self);
            Affine::IDENTITY
        })
    }

    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }
}

/// Map a point from a shape's local frame into world coordinates.
pub fn to_world(local: Point, matrix: &Affine) -> Point {
    matrix.apply(local)
}

/// Map a world point into a shape's local frame.
pub fn to_local(world: Point, matrix: &Affine) -> Point {
    to_world(world, &matrix.invert_or_identity())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_compose_translation_only() {
        let m = Affine::compose(Point::new(100.0, 50.0), 0.0, 1.0, 1.0);
        let world = to_world(Point::new(10.0, 10.0), &m);
        assert!(world.approx_eq(&Point::new(110.0, 60.0), EPS));
    }

    #[test]
    fn test_compose_rotation_then_translation() {
        // 90 degrees maps +x onto +y
        let m = Affine::compose(Point::new(10.0, 0.0), 90.0, 1.0, 1.0);
        let world = to_world(Point::new(1.0, 0.0), &m);
        assert!(world.approx_eq(&Point::new(10.0, 1.0), EPS));
    }

    #[test]
    fn test_scale_applies_before_rotation() {
        let m = Affine::compose(Point::ORIGIN, 90.0, 2.0, 3.0);
        let world = to_world(Point::new(1.0, 1.0), &m);
        assert!(world.approx_eq(&Point::new(-3.0, 2.0), EPS));
    }

    #[test]
    fn test_local_world_roundtrip() {
        let m = Affine::compose(Point::new(-40.0, 12.5), 33.0, 1.5, 0.75);
        for local in [
            Point::new(0.0, 0.0),
            Point::new(17.0, -3.0),
            Point::new(-250.0, 99.0),
        ] {
            let back = to_local(to_world(local, &m), &m);
            assert!(back.approx_eq(&local, 1e-7));
        }
    }

    #[test]
    fn test_invert_identity() {
        assert_eq!(Affine::IDENTITY.invert(), Some(Affine::IDENTITY));
    }

    #[test]
    fn test_zero_scale_falls_back_to_identity() {
        let m = Affine::compose(Point::new(5.0, 5.0), 0.0, 0.0, 1.0);
        assert!(m.invert().is_none());

        let local = to_local(Point::new(7.0, 8.0), &m);
        assert!(local.x.is_finite() && local.y.is_finite());
        assert!(local.approx_eq(&Point::new(7.0, 8.0), EPS));
    }

    #[test]
    fn test_multiply_order() {
        let t = Affine::translate(5.0, 0.0);
        let s = Affine::scale(2.0, 2.0);
        // scale first, then translate
        let p = t.multiply(&s).apply(Point::new(1.0, 1.0));
        assert!(p.approx_eq(&Point::new(7.0, 2.0), EPS));
        // translate first, then scale
        let q = s.multiply(&t).apply(Point::new(1.0, 1.0));
        assert!(q.approx_eq(&Point::new(12.0, 2.0), EPS));
    }
}
