//! Rectangle primitive.

use super::{Geometry, MIN_EXTENT, PATH_TOLERANCE, Polyline, Primitive, axis_scales};
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Coefficients smaller than this count as zero when classifying transforms.
const AXIS_EPSILON: f64 = 1e-9;

/// An axis-aligned rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Top-left corner position.
    pub origin: Point,
    /// Width and height.
    pub size: Size,
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(origin: Point, width: f64, height: f64) -> Self {
        Self {
            origin,
            size: Size::new(width, height),
            corner_radius: 0.0,
        }
    }

    /// Create a rectangle from two opposite corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.width(), rect.height())
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius.max(0.0);
        self
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// Corner radius clamped to half the smaller side.
    pub fn effective_radius(&self) -> f64 {
        let max = self.size.width.min(self.size.height) / 2.0;
        self.corner_radius.clamp(0.0, max.max(0.0))
    }

    /// Signed distance to the (rounded) outline; negative inside.
    pub fn signed_distance(&self, point: Point) -> f64 {
        let r = self.effective_radius();
        let rect = self.as_rect();
        let center = rect.center();
        let qx = (point.x - center.x).abs() - (rect.width() / 2.0 - r);
        let qy = (point.y - center.y).abs() - (rect.height() / 2.0 - r);
        let outside = Vec2::new(qx.max(0.0), qy.max(0.0)).hypot();
        let inside = qx.max(qy).min(0.0);
        outside + inside - r
    }

    fn corners(&self) -> [Point; 4] {
        let r = self.as_rect();
        [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
    }
}

impl Geometry for Rectangle {
    fn bounds(&self) -> Option<Rect> {
        Some(self.as_rect())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.signed_distance(point).abs() <= tolerance
    }

    fn contains_filled(&self, point: Point) -> bool {
        self.signed_distance(point) <= 0.0
    }

    /// Axis-preserving maps keep a rectangle; anything else becomes a closed
    /// polyline through the mapped corners (rounded corners are dropped).
    fn transformed(&self, affine: Affine) -> Primitive {
        let [a, b, c, d, _, _] = affine.as_coeffs();
        let axis_aligned = (b.abs() < AXIS_EPSILON && c.abs() < AXIS_EPSILON)
            || (a.abs() < AXIS_EPSILON && d.abs() < AXIS_EPSILON);
        if axis_aligned {
            let scales = axis_scales(affine);
            let mapped = affine.transform_rect_bbox(self.as_rect());
            let mut rect = Rectangle::new(mapped.origin(), mapped.width(), mapped.height());
            rect.corner_radius = self.corner_radius * scales.x.min(scales.y);
            return Primitive::Rectangle(rect);
        }
        let points = self.corners().iter().map(|p| affine * *p).collect();
        Primitive::Polyline(Polyline::closed(points))
    }

    fn is_finite(&self) -> bool {
        self.origin.is_finite()
            && self.size.width.is_finite()
            && self.size.height.is_finite()
            && self.corner_radius.is_finite()
    }

    fn is_degenerate(&self) -> bool {
        self.size.width < MIN_EXTENT || self.size.height < MIN_EXTENT
    }

    fn to_path(&self) -> BezPath {
        let radius = self.effective_radius();
        if radius > 0.0 {
            RoundedRect::from_rect(self.as_rect(), radius).to_path(PATH_TOLERANCE)
        } else {
            self.as_rect().to_path(PATH_TOLERANCE)
        }
    }

    fn anchor_points(&self) -> Vec<Point> {
        let mut points = self.corners().to_vec();
        points.push(self.as_rect().center());
        points
    }
}
