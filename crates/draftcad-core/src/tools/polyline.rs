//! Multi-point polyline construction.

use crate::primitives::{Polyline, Primitive};
use crate::snap::snap_line_endpoint;
use kurbo::Point;

/// What a polyline click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexOutcome {
    /// A vertex was appended.
    Appended,
    /// The click landed on the first vertex; the outline is closed and ready to commit.
    Closed,
}

/// Vertices collected so far plus the rubber-band cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineConstruction {
    vertices: Vec<Point>,
    cursor: Option<Point>,
    closed: bool,
    angle_snap: bool,
}

impl PolylineConstruction {
    pub fn new(first: Point, angle_snap: bool) -> Self {
        Self {
            vertices: vec![first],
            cursor: None,
            closed: false,
            angle_snap,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    fn constrain(&self, point: Point) -> Point {
        match (self.angle_snap, self.vertices.last()) {
            (true, Some(last)) => snap_line_endpoint(*last, point).point,
            _ => point,
        }
    }

    /// Handle a click. With three or more vertices, a click within
    /// `close_tolerance` of the first vertex closes the outline.
    pub fn click(&mut self, point: Point, close_tolerance: f64) -> VertexOutcome {
        if self.vertices.len() >= 3 && (point - self.vertices[0]).hypot() <= close_tolerance {
            self.closed = true;
            self.cursor = None;
            return VertexOutcome::Closed;
        }
        let point = self.constrain(point);
        self.vertices.push(point);
        self.cursor = None;
        VertexOutcome::Appended
    }

    /// Rubber-band the trailing segment to `point`.
    pub fn hover(&mut self, point: Point) {
        self.cursor = Some(self.constrain(point));
    }

    /// Remove the last vertex; returns false when none remain.
    pub fn pop_vertex(&mut self) -> bool {
        self.vertices.pop();
        !self.vertices.is_empty()
    }

    /// Provisional outline including the rubber-band point.
    pub fn preview(&self) -> Primitive {
        let mut points = self.vertices.clone();
        points.extend(self.cursor);
        Primitive::Polyline(Polyline {
            points,
            closed: self.closed,
        })
    }

    /// Final outline: committed vertices only, consecutive duplicates removed.
    pub fn finish(&self) -> Primitive {
        let mut polyline = Polyline {
            points: self.vertices.clone(),
            closed: self.closed,
        };
        polyline.dedup();
        if polyline.closed && polyline.points.len() > 1 {
            let first = polyline.points[0];
            if polyline.points.last().is_some_and(|p| (*p - first).hypot() < crate::primitives::MIN_EXTENT) {
                polyline.points.pop();
            }
        }
        Primitive::Polyline(polyline)
    }
}
