// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pan/zoom viewport.
//!
//! Holds the world-to-screen transform of the canvas. Zoom is kept in
//! `[MIN_ZOOM, MAX_ZOOM]` after every operation.

use crate::models::annotation::Point;
use crate::util::transform::{to_local, to_world, Affine};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// World to screen transform (uniform scale plus translation).
    view: Affine,
    /// Size of the visible canvas in screen pixels.
    size: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Point::new(800.0, 600.0))
    }
}

impl Viewport {
    pub fn new(size: Point) -> Self {
        Self {
            view: Affine::IDENTITY,
            size,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.view.a
    }

    pub fn pan(&self) -> Point {
        Point::new(self.view.e, self.view.f)
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn transform(&self) -> &Affine {
        &self.view
    }

    pub fn to_screen(&self, world: Point) -> Point {
        to_world(world, &self.view)
    }

    pub fn to_world(&self, screen: Point) -> Point {
        to_local(screen, &self.view)
    }

    /// Convert a screen distance into world units at the current zoom.
    pub fn screen_to_world_distance(&self, pixels: f64) -> f64 {
        pixels / self.zoom()
    }

    /// Translate the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view = Affine::translate(dx, dy).multiply(&self.view);
    }

    /// Multiply the zoom by `factor`, keeping the screen point `anchor`
    /// fixed. The resulting zoom is clamped.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        // 0 and +inf still clamp to the zoom bounds
        if factor.is_nan() || factor < 0.0 {
            return;
        }
        let current = self.zoom();
        let target = (current * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let applied = target / current;
        self.view = Affine::translate(anchor.x, anchor.y)
            .multiply(&Affine::scale(applied, applied))
            .multiply(&Affine::translate(-anchor.x, -anchor.y))
            .multiply(&self.view);
        // Pin the diagonal exactly to the clamped value.
        self.view.a = target;
        self.view.d = target;
    }

    /// Wheel zoom: exponential in the scroll delta, anchored at the pointer.
    pub fn zoom_by_wheel(&mut self, delta: f64, base: f64, anchor: Point) {
        self.zoom_at(base.powf(delta), anchor);
    }

    /// Button zoom in, anchored at the viewport centre.
    pub fn zoom_in(&mut self, step: f64) {
        self.zoom_at(step, self.center());
    }

    /// Button zoom out, anchored at the viewport centre.
    pub fn zoom_out(&mut self, step: f64) {
        self.zoom_at(1.0 / step, self.center());
    }

    pub fn reset(&mut self) {
        self.view = Affine::IDENTITY;
    }

    /// Zoom and centre so an image of the given size fits the viewport.
    pub fn fit(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            self.reset();
            return;
        }
        let zoom = (self.size.x / width)
            .min(self.size.y / height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let offset = Point::new(
            (self.size.x - width * zoom) / 2.0,
            (self.size.y - height * zoom) / 2.0,
        );
        self.view = Affine::translate(offset.x, offset.y).multiply(&Affine::scale(zoom, zoom));
    }

    fn center(&self) -> Point {
        self.size.scale(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_identity_mapping() {
        let viewport = Viewport::default();
        let p = Point::new(12.0, 34.0);
        assert!(viewport.to_world(p).approx_eq(&p, EPS));
    }

    #[test]
    fn test_pan_moves_world_under_pointer() {
        let mut viewport = Viewport::default();
        viewport.pan_by(10.0, -5.0);
        let world = viewport.to_world(Point::new(10.0, -5.0));
        assert!(world.approx_eq(&Point::ORIGIN, EPS));
    }

    #[test]
    fn test_wheel_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::default();
        viewport.pan_by(40.0, 25.0);
        let anchor = Point::new(300.0, 200.0);
        let before = viewport.to_world(anchor);

        viewport.zoom_by_wheel(-200.0, 0.999, anchor);
        assert!(viewport.zoom() > 1.0);
        let after = viewport.to_world(anchor);
        assert!(after.approx_eq(&before, 1e-6));
    }

    #[test]
    fn test_buttons_anchor_at_center() {
        let mut viewport = Viewport::new(Point::new(400.0, 300.0));
        let center = Point::new(200.0, 150.0);
        let before = viewport.to_world(center);
        viewport.zoom_in(1.1);
        assert!((viewport.zoom() - 1.1).abs() < EPS);
        assert!(viewport.to_world(center).approx_eq(&before, 1e-6));
        viewport.zoom_out(1.1);
        assert!((viewport.zoom() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_stays_clamped() {
        let mut viewport = Viewport::default();
        for _ in 0..200 {
            viewport.zoom_in(1.1);
            assert!(viewport.zoom() <= MAX_ZOOM);
        }
        assert_eq!(viewport.zoom(), MAX_ZOOM);

        for i in 0..300 {
            viewport.zoom_by_wheel(500.0, 0.999, Point::new(i as f64, 3.0));
            assert!(viewport.zoom() >= MIN_ZOOM);
        }
        assert_eq!(viewport.zoom(), MIN_ZOOM);

        viewport.zoom_at(f64::NAN, Point::ORIGIN);
        assert_eq!(viewport.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_huge_wheel_delta_saturates() {
        let anchor = Point::new(40.0, 30.0);
        let mut viewport = Viewport::default();
        viewport.zoom_by_wheel(1e6, 0.999, anchor);
        assert_eq!(viewport.zoom(), MIN_ZOOM);
        viewport.zoom_by_wheel(-1e6, 0.999, anchor);
        assert_eq!(viewport.zoom(), MAX_ZOOM);
        assert!(viewport.to_world(anchor).approx_eq(&anchor, 1e-9));
    }

    #[test]
    fn test_fit_centers_image() {
        let mut viewport = Viewport::new(Point::new(800.0, 600.0));
        viewport.fit(1600.0, 600.0);
        assert!((viewport.zoom() - 0.5).abs() < EPS);
        let top_left = viewport.to_screen(Point::ORIGIN);
        assert!(top_left.approx_eq(&Point::new(0.0, 150.0), EPS));
    }
}
