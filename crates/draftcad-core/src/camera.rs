//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Camera manages the global view transform of a scene.
///
/// It handles panning (translation) and zooming (scaling) operations,
/// converting between device coordinates and world coordinates. Resize
/// notifications only update `viewport`; scene content is never touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in device pixels.
    pub offset: Vec2,
    /// Device pixels per world unit.
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
    /// Size of the host view in device pixels.
    #[serde(default = "default_viewport")]
    pub viewport: Size,
}

fn default_viewport() -> Size {
    Size::new(800.0, 600.0)
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.01,
            max_zoom: 100.0,
            viewport: default_viewport(),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// World → device transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Device → world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a tolerance in device pixels into world units at the current zoom.
    pub fn world_tolerance(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    /// Visible world-space rectangle.
    pub fn visible_world_rect(&self) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right =
            self.screen_to_world(Point::new(self.viewport.width, self.viewport.height));
        Rect::from_points(top_left, bottom_right)
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width.max(0.0), height.max(0.0));
    }

    /// Pan the camera by a delta in device pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom, keeping the given device point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Bring loaded values back into range: zoom limits positive and
    /// ordered, zoom clamped to them, offset and viewport finite.
    ///
    /// Returns true when anything changed.
    pub fn sanitize(&mut self) -> bool {
        let defaults = Camera::default();
        let before = self.clone();
        let limits_valid = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !limits_valid {
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }
        self.zoom = if self.zoom.is_finite() {
            self.zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            defaults.zoom
        };
        if !self.offset.is_finite() {
            self.offset = Vec2::ZERO;
        }
        if !(self.viewport.width.is_finite() && self.viewport.height.is_finite()) {
            self.viewport = defaults.viewport;
        }
        self.viewport = Size::new(self.viewport.width.max(0.0), self.viewport.height.max(0.0));
        *self != before
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit the camera to show the given world rectangle with `padding` pixels around it.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
            self.reset();
            self.offset = Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
                - bounds.center().to_vec2();
            return;
        }

        let padded = Size::new(
            (self.viewport.width - padding * 2.0).max(1.0),
            (self.viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width().max(f64::EPSILON);
        let scale_y = padded.height / bounds.height().max(f64::EPSILON);
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        let center = bounds.center();
        self.offset = Vec2::new(
            self.viewport.width / 2.0 - center.x * self.zoom,
            self.viewport.height / 2.0 - center.y * self.zoom,
        );
    }
}
