//! Polyline primitive (open chain or closed polygon).

use super::{Geometry, MIN_EXTENT, Primitive, bounds_of_points, point_to_segment_dist};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// An ordered sequence of vertices, optionally closed back to the first one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
}

impl Polyline {
    /// Create an open polyline.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    /// Create a closed polygon.
    pub fn closed(points: Vec<Point>) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a vertex.
    pub fn append_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Move the trailing (rubber-band) vertex.
    pub fn set_last_point(&mut self, point: Point) {
        if let Some(last) = self.points.last_mut() {
            *last = point;
        }
    }

    /// Remove and return the trailing vertex.
    pub fn pop_point(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Close the chain back to its first vertex.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Drop consecutive vertices closer than `MIN_EXTENT`.
    pub fn dedup(&mut self) {
        self.points.dedup_by(|a, b| (*a - *b).hypot() < MIN_EXTENT);
    }

    /// Segments in drawing order, including the closing one.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = (self.closed && self.points.len() > 2)
            .then(|| (self.points[self.points.len() - 1], self.points[0]));
        self.points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }

    /// Total outline length.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).hypot()).sum()
    }

    /// Signed shoelace area (zero for open chains).
    pub fn area(&self) -> f64 {
        if !self.closed || self.points.len() < 3 {
            return 0.0;
        }
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x * q.y - q.x * p.y
            })
            .sum();
        twice / 2.0
    }
}

impl Geometry for Polyline {
    fn bounds(&self) -> Option<Rect> {
        if self.points.len() < 2 {
            return None;
        }
        bounds_of_points(&self.points)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        self.segments()
            .any(|(a, b)| point_to_segment_dist(point, a, b) <= tolerance)
    }

    /// Even-odd rule.
    fn contains_filled(&self, point: Point) -> bool {
        if !self.closed || self.points.len() < 3 {
            return false;
        }
        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let (pi, pj) = (self.points[i], self.points[j]);
            if (pi.y > point.y) != (pj.y > point.y) {
                let x_cross = pi.x + (point.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn transformed(&self, affine: Affine) -> Primitive {
        Primitive::Polyline(Polyline {
            points: self.points.iter().map(|p| affine * *p).collect(),
            closed: self.closed,
        })
    }

    fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    fn is_degenerate(&self) -> bool {
        if self.points.len() < 2 || self.length() < MIN_EXTENT {
            return true;
        }
        self.closed && (self.points.len() < 3 || self.area().abs() < MIN_EXTENT * MIN_EXTENT)
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        if self.closed {
            path.close_path();
        }
        path
    }

    fn anchor_points(&self) -> Vec<Point> {
        self.points.clone()
    }
}
