//! Line segment primitive.

use super::{Geometry, MIN_EXTENT, Primitive, point_to_segment_dist};
use kurbo::{Affine, BezPath, Line as KurboLine, Point, Rect};
use serde::{Deserialize, Serialize};

/// A straight segment between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

impl Line {
    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Move the free endpoint during construction.
    pub fn set_end(&mut self, end: Point) {
        self.end = end;
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    /// Get the midpoint of the line.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Get as a kurbo Line.
    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start, self.end)
    }
}

impl Geometry for Line {
    fn bounds(&self) -> Option<Rect> {
        Some(Rect::from_points(self.start, self.end))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end) <= tolerance
    }

    fn contains_filled(&self, _point: Point) -> bool {
        false
    }

    fn transformed(&self, affine: Affine) -> Primitive {
        Primitive::Line(Line::new(affine * self.start, affine * self.end))
    }

    fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    fn is_degenerate(&self) -> bool {
        self.length() < MIN_EXTENT
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn anchor_points(&self) -> Vec<Point> {
        vec![self.start, self.end, self.midpoint()]
    }
}
