//! Elliptical arc primitive.

use super::ellipse::ring_hit;
use super::{Ellipse, Geometry, MIN_EXTENT, MIN_SWEEP, PATH_TOLERANCE, Primitive, unrotate};
use kurbo::{Affine, Arc as KurboArc, BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A section of an ellipse outline.
///
/// Angles are parametric (measured on the unit circle before scaling by the
/// radii) in radians. A positive sweep runs towards +y of the local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Center of the underlying ellipse.
    pub center: Point,
    /// Radii of the underlying ellipse.
    pub radii: Vec2,
    /// Parametric start angle.
    pub start_angle: f64,
    /// Signed parametric sweep, clamped to one full turn.
    pub sweep_angle: f64,
    /// Rotation of the ellipse's x axis.
    #[serde(default)]
    pub x_rotation: f64,
}

impl Arc {
    /// Create a circular arc.
    pub fn new(center: Point, radius: f64, start_angle: f64, sweep_angle: f64) -> Self {
        Self {
            center,
            radii: Vec2::new(radius, radius),
            start_angle,
            sweep_angle: sweep_angle.clamp(-TAU, TAU),
            x_rotation: 0.0,
        }
    }

    /// Update the sweep during construction.
    pub fn set_sweep(&mut self, sweep_angle: f64) {
        self.sweep_angle = sweep_angle.clamp(-TAU, TAU);
    }

    /// Update both radii during construction.
    pub fn set_radius(&mut self, radius: f64) {
        self.radii = Vec2::new(radius.abs(), radius.abs());
    }

    fn ellipse(&self) -> Ellipse {
        Ellipse {
            center: self.center,
            radii: self.radii,
            x_rotation: self.x_rotation,
        }
    }

    /// Point on the arc at a parametric angle.
    pub fn point_at(&self, angle: f64) -> Point {
        self.ellipse().point_at(angle)
    }

    pub fn start_point(&self) -> Point {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point {
        self.point_at(self.start_angle + self.sweep_angle)
    }

    /// Whether a parametric angle falls inside the swept range.
    pub fn contains_angle(&self, angle: f64) -> bool {
        if self.sweep_angle.abs() >= TAU {
            return true;
        }
        let offset = if self.sweep_angle >= 0.0 {
            (angle - self.start_angle).rem_euclid(TAU)
        } else {
            (self.start_angle - angle).rem_euclid(TAU)
        };
        offset <= self.sweep_angle.abs()
    }

    /// Parametric angle of a point relative to the ellipse frame.
    fn angle_of(&self, point: Point) -> f64 {
        let local = unrotate(point - self.center, self.x_rotation);
        (local.y / self.radii.y.max(f64::EPSILON)).atan2(local.x / self.radii.x.max(f64::EPSILON))
    }

    pub fn as_kurbo(&self) -> KurboArc {
        KurboArc {
            center: self.center,
            radii: self.radii,
            start_angle: self.start_angle,
            sweep_angle: self.sweep_angle,
            x_rotation: self.x_rotation,
        }
    }
}

impl Geometry for Arc {
    fn bounds(&self) -> Option<Rect> {
        let mut bounds = Rect::from_points(self.start_point(), self.end_point());
        // Extremes of the rotated ellipse, where they fall inside the sweep.
        let (sin, cos) = self.x_rotation.sin_cos();
        let tx = (-self.radii.y * sin).atan2(self.radii.x * cos);
        let ty = (self.radii.y * cos).atan2(self.radii.x * sin);
        for t in [tx, tx + std::f64::consts::PI, ty, ty + std::f64::consts::PI] {
            if self.contains_angle(t) {
                bounds = bounds.union_pt(self.point_at(t));
            }
        }
        Some(bounds)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let start = self.start_point();
        if self.sweep_angle.abs() < MIN_SWEEP || self.radii.x.min(self.radii.y) < f64::EPSILON {
            return (point - start).hypot() <= tolerance;
        }
        if (point - start).hypot() <= tolerance || (point - self.end_point()).hypot() <= tolerance
        {
            return true;
        }
        ring_hit(&self.ellipse(), point, tolerance) && self.contains_angle(self.angle_of(point))
    }

    fn contains_filled(&self, _point: Point) -> bool {
        false
    }

    fn transformed(&self, affine: Affine) -> Primitive {
        let mapped = affine * self.ellipse().as_kurbo();
        let (radii, x_rotation) = mapped.radii_and_rotation();
        let mut arc = Arc {
            center: mapped.center(),
            radii: Vec2::new(radii.x.abs(), radii.y.abs()),
            start_angle: 0.0,
            sweep_angle: self.sweep_angle,
            x_rotation,
        };
        arc.start_angle = arc.angle_of(affine * self.start_point());
        if affine.determinant() < 0.0 {
            arc.sweep_angle = -arc.sweep_angle;
        }
        Primitive::Arc(arc)
    }

    fn is_finite(&self) -> bool {
        self.center.is_finite()
            && self.radii.is_finite()
            && self.start_angle.is_finite()
            && self.sweep_angle.is_finite()
            && self.x_rotation.is_finite()
    }

    fn is_degenerate(&self) -> bool {
        self.radii.x < MIN_EXTENT || self.radii.y < MIN_EXTENT || self.sweep_angle.abs() < MIN_SWEEP
    }

    fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(PATH_TOLERANCE)
    }

    fn anchor_points(&self) -> Vec<Point> {
        vec![
            self.center,
            self.start_point(),
            self.end_point(),
            self.point_at(self.start_angle + self.sweep_angle / 2.0),
        ]
    }
}
