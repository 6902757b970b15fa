//! Ellipse primitive.

use super::{Geometry, MIN_EXTENT, PATH_TOLERANCE, Primitive, rotate, unrotate};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An ellipse given by centre, radii and rotation of its x axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center point.
    pub center: Point,
    /// Radii along the (rotated) x and y axes.
    pub radii: Vec2,
    /// Rotation of the x axis in radians.
    #[serde(default)]
    pub x_rotation: f64,
}

impl Ellipse {
    /// Create a new axis-aligned ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            center,
            radii: Vec2::new(radius_x, radius_y),
            x_rotation: 0.0,
        }
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    /// Create an ellipse inscribed in a rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }

    /// Update radii during construction.
    pub fn set_radii(&mut self, radius_x: f64, radius_y: f64) {
        self.radii = Vec2::new(radius_x.abs(), radius_y.abs());
    }

    /// Get as a kurbo Ellipse.
    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(self.center, self.radii, self.x_rotation)
    }

    /// Point offset in the ellipse's own (unrotated) frame, normalized by radii.
    fn normalized(&self, point: Point, radii: Vec2) -> Option<f64> {
        if radii.x < f64::EPSILON || radii.y < f64::EPSILON {
            return None;
        }
        let local = unrotate(point - self.center, self.x_rotation);
        let nx = local.x / radii.x;
        let ny = local.y / radii.y;
        Some(nx * nx + ny * ny)
    }

    pub(crate) fn point_at(&self, angle: f64) -> Point {
        let local = Vec2::new(self.radii.x * angle.cos(), self.radii.y * angle.sin());
        self.center + rotate(local, self.x_rotation)
    }
}

/// Half extents of the bounding box of a rotated ellipse.
pub(crate) fn rotated_half_extents(radii: Vec2, rotation: f64) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(
        ((radii.x * cos).powi(2) + (radii.y * sin).powi(2)).sqrt(),
        ((radii.x * sin).powi(2) + (radii.y * cos).powi(2)).sqrt(),
    )
}

/// Ring test shared by ellipses and arcs: inside the inflated outline and
/// outside the deflated one.
pub(crate) fn ring_hit(ellipse: &Ellipse, point: Point, tolerance: f64) -> bool {
    let outer = Vec2::new(ellipse.radii.x + tolerance, ellipse.radii.y + tolerance);
    match ellipse.normalized(point, outer) {
        Some(d) if d > 1.0 => return false,
        None => return (point - ellipse.center).hypot() <= tolerance,
        _ => {}
    }
    let inner = Vec2::new(
        (ellipse.radii.x - tolerance).max(0.0),
        (ellipse.radii.y - tolerance).max(0.0),
    );
    match ellipse.normalized(point, inner) {
        Some(d) => d >= 1.0,
        None => true,
    }
}

impl Geometry for Ellipse {
    fn bounds(&self) -> Option<Rect> {
        let half = rotated_half_extents(self.radii, self.x_rotation);
        Some(Rect::new(
            self.center.x - half.x,
            self.center.y - half.y,
            self.center.x + half.x,
            self.center.y + half.y,
        ))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        ring_hit(self, point, tolerance)
    }

    fn contains_filled(&self, point: Point) -> bool {
        self.normalized(point, self.radii)
            .is_some_and(|d| d <= 1.0)
    }

    fn transformed(&self, affine: Affine) -> Primitive {
        let mapped = affine * self.as_kurbo();
        let (radii, x_rotation) = mapped.radii_and_rotation();
        Primitive::Ellipse(Ellipse {
            center: mapped.center(),
            radii: Vec2::new(radii.x.abs(), radii.y.abs()),
            x_rotation,
        })
    }

    fn is_finite(&self) -> bool {
        self.center.is_finite() && self.radii.is_finite() && self.x_rotation.is_finite()
    }

    fn is_degenerate(&self) -> bool {
        self.radii.x < MIN_EXTENT || self.radii.y < MIN_EXTENT
    }

    fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(PATH_TOLERANCE)
    }

    fn anchor_points(&self) -> Vec<Point> {
        let mut points = vec![self.center];
        points.extend((0..4).map(|i| self.point_at(i as f64 * std::f64::consts::FRAC_PI_2)));
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_creation() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        assert!((ellipse.center.x - 50.0).abs() < f64::EPSILON);
        assert!((ellipse.radii.x - 30.0).abs() < f64::EPSILON);
        assert!((ellipse.radii.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_outline_only() {
        let circle = Ellipse::circle(Point::new(0.0, 0.0), 10.0);
        assert!(circle.hit_test(Point::new(10.0, 0.0), 0.5));
        assert!(circle.hit_test(Point::new(0.0, -10.4), 0.5));
        assert!(!circle.hit_test(Point::new(15.0, 0.0), 0.5));
        assert!(!circle.hit_test(Point::new(0.0, 0.0), 0.5));
    }

    #[test]
    fn test_contains_filled() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        assert!(ellipse.contains_filled(Point::new(50.0, 50.0)));
        assert!(ellipse.contains_filled(Point::new(79.0, 50.0)));
        assert!(!ellipse.contains_filled(Point::new(50.0, 71.0)));
    }

    #[test]
    fn test_bounds() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        assert_eq!(ellipse.bounds(), Some(Rect::new(20.0, 30.0, 80.0, 70.0)));
    }

    #[test]
    fn test_rotated_bounds_swap_axes() {
        let mut ellipse = Ellipse::new(Point::ZERO, 30.0, 20.0);
        ellipse.x_rotation = std::f64::consts::FRAC_PI_2;
        let b = ellipse.bounds().unwrap();
        assert!((b.width() - 40.0).abs() < 1e-9);
        assert!((b.height() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_transformed_scale() {
        let circle = Ellipse::circle(Point::new(1.0, 1.0), 5.0);
        let Primitive::Ellipse(scaled) = circle.transformed(Affine::scale_non_uniform(2.0, 1.0))
        else {
            panic!("expected an ellipse");
        };
        let b = scaled.bounds().unwrap();
        assert!((b.width() - 20.0).abs() < 1e-9);
        assert!((b.height() - 10.0).abs() < 1e-9);
        assert!((scaled.center.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate() {
        assert!(Ellipse::new(Point::ZERO, 0.0, 10.0).is_degenerate());
        assert!(!Ellipse::circle(Point::ZERO, 1.0).is_degenerate());
    }
}
