use eframe::egui::emath::TSTransform;
use eframe::egui::{Pos2, Vec2};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Zooms by `factor` keeping `screen_point` fixed on screen.
    ///
    /// The zoom is clamped to `[0.5, 4]`; pan follows the factor actually
    /// applied after clamping.
    pub fn zoom_at(&mut self, screen_point: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let applied = zoom / self.zoom;
        let anchor = screen_point.to_vec2();
        self.pan = anchor - (anchor - self.pan) * applied;
        self.zoom = zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn transform(&self) -> TSTransform {
        TSTransform::new(self.pan, self.zoom)
    }

    pub fn compose(&self, base: TSTransform) -> TSTransform {
        self.transform() * base
    }

    pub fn to_screen(&self, base: TSTransform, world_point: Pos2) -> Pos2 {
        self.compose(base).mul_pos(world_point)
    }

    pub fn to_world(&self, base: TSTransform, screen_point: Pos2) -> Pos2 {
        self.compose(base).inverse().mul_pos(screen_point)
    }
}

pub fn base_transform(layout_size: Vec2, screen_size: Vec2, base_zoom: f32) -> TSTransform {
    let translation = (screen_size - layout_size * base_zoom) * 0.5;
    TSTransform::new(translation, base_zoom)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut viewport = Viewport {
            pan: vec2(30.0, -10.0),
            zoom: 1.0,
        };
        let base = TSTransform::IDENTITY;
        let cursor = pos2(200.0, 150.0);
        let under_cursor = viewport.to_world(base, cursor);

        viewport.zoom_at(cursor, 2.0);

        assert_eq!(viewport.zoom, 2.0);
        assert!(close(viewport.to_screen(base, under_cursor), cursor));
        assert_eq!(viewport.pan, vec2(200.0, 150.0) - (vec2(200.0, 150.0) - vec2(30.0, -10.0)) * 2.0);
    }

    #[test]
    fn zoom_is_clamped_and_point_still_fixed() {
        let mut viewport = Viewport::default();
        let base = TSTransform::IDENTITY;
        let cursor = pos2(50.0, 80.0);
        let under_cursor = viewport.to_world(base, cursor);

        viewport.zoom_at(cursor, 100.0);
        assert_eq!(viewport.zoom, MAX_ZOOM);
        assert!(close(viewport.to_screen(base, under_cursor), cursor));

        viewport.zoom_at(cursor, 0.001);
        assert_eq!(viewport.zoom, MIN_ZOOM);
        assert!(close(viewport.to_screen(base, under_cursor), cursor));
    }

    #[test]
    fn invalid_factor_is_ignored() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(pos2(1.0, 1.0), f32::NAN);
        viewport.zoom_at(pos2(1.0, 1.0), -2.0);
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn pan_is_additive_and_reset_restores_identity() {
        let mut viewport = Viewport::default();
        viewport.pan_by(vec2(5.0, 5.0));
        viewport.pan_by(vec2(-2.0, 10_000.0));
        assert_eq!(viewport.pan, vec2(3.0, 10_005.0));

        viewport.zoom_at(pos2(0.0, 0.0), 3.0);
        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn viewport_composes_after_base() {
        let base = base_transform(vec2(100.0, 100.0), vec2(300.0, 200.0), 1.0);
        let viewport = Viewport {
            pan: vec2(10.0, 0.0),
            zoom: 2.0,
        };
        // Base puts layout origin at (100, 50); viewport scales then pans.
        assert!(close(viewport.to_screen(base, pos2(0.0, 0.0)), pos2(210.0, 100.0)));
        assert!(close(viewport.to_screen(base, pos2(10.0, 0.0)), pos2(230.0, 100.0)));
    }
}
