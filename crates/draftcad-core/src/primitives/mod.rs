//! Geometric primitives in local coordinates.
//!
//! A [`Primitive`] is a plain value: it knows its bounds, how to hit-test a
//! point against its outline (or filled interior), and how to map itself
//! through an affine transform. It carries no identity, style or layer; those
//! live on [`crate::shape::Shape`].

mod arc;
mod ellipse;
mod image;
mod line;
mod polyline;
mod rectangle;
mod text;

pub use arc::Arc;
pub use ellipse::Ellipse;
pub use image::Image;
pub use line::Line;
pub use polyline::Polyline;
pub use rectangle::Rectangle;
pub use text::Text;

use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum extent (in world units) below which committed geometry is degenerate.
pub const MIN_EXTENT: f64 = 1e-3;

/// Minimum sweep (radians) for an arc to be considered non-degenerate.
pub const MIN_SWEEP: f64 = 1e-6;

/// Tolerance used by `kurbo` when flattening curves into paths.
pub(crate) const PATH_TOLERANCE: f64 = 0.1;

/// Behaviour shared by every primitive variant.
pub trait Geometry {
    /// Axis-aligned bounding box in local coordinates, `None` when empty.
    fn bounds(&self) -> Option<Rect>;

    /// Whether `point` lies within `tolerance` of the primitive's outline.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Whether `point` lies inside the filled interior (always false for open variants).
    fn contains_filled(&self, point: Point) -> bool;

    /// A new primitive with the geometry mapped through `affine`.
    fn transformed(&self, affine: Affine) -> Primitive;

    /// Whether all parameters are finite.
    fn is_finite(&self) -> bool;

    /// Whether the geometry is below the minimum extent.
    fn is_degenerate(&self) -> bool;

    /// Path representation for renderers.
    fn to_path(&self) -> BezPath;

    /// Characteristic points (vertices, corners, centres) used for snapping.
    fn anchor_points(&self) -> Vec<Point>;
}

/// Fieldless discriminant of [`Primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Line,
    Arc,
    Ellipse,
    Rectangle,
    Polyline,
    Text,
    Image,
}

/// Closed set of drawable geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Line(Line),
    Arc(Arc),
    Ellipse(Ellipse),
    Rectangle(Rectangle),
    Polyline(Polyline),
    Text(Text),
    Image(Image),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Line(_) => PrimitiveKind::Line,
            Primitive::Arc(_) => PrimitiveKind::Arc,
            Primitive::Ellipse(_) => PrimitiveKind::Ellipse,
            Primitive::Rectangle(_) => PrimitiveKind::Rectangle,
            Primitive::Polyline(_) => PrimitiveKind::Polyline,
            Primitive::Text(_) => PrimitiveKind::Text,
            Primitive::Image(_) => PrimitiveKind::Image,
        }
    }

    fn geometry(&self) -> &dyn Geometry {
        match self {
            Primitive::Line(p) => p,
            Primitive::Arc(p) => p,
            Primitive::Ellipse(p) => p,
            Primitive::Rectangle(p) => p,
            Primitive::Polyline(p) => p,
            Primitive::Text(p) => p,
            Primitive::Image(p) => p,
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.geometry().bounds()
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.geometry().hit_test(point, tolerance)
    }

    pub fn contains_filled(&self, point: Point) -> bool {
        self.geometry().contains_filled(point)
    }

    pub fn transformed(&self, affine: Affine) -> Primitive {
        self.geometry().transformed(affine)
    }

    pub fn is_finite(&self) -> bool {
        self.geometry().is_finite()
    }

    /// Non-finite geometry is always degenerate.
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.geometry().is_degenerate()
    }

    pub fn to_path(&self) -> BezPath {
        self.geometry().to_path()
    }

    pub fn anchor_points(&self) -> Vec<Point> {
        self.geometry().anchor_points()
    }

    /// Whether this variant has a fillable interior.
    pub fn is_closed(&self) -> bool {
        match self {
            Primitive::Line(_) | Primitive::Arc(_) => false,
            Primitive::Polyline(p) => p.closed,
            _ => true,
        }
    }

    /// Whether a fill reference applies: closed outlines other than text and
    /// image boxes.
    pub fn is_fillable(&self) -> bool {
        self.is_closed() && !matches!(self, Primitive::Text(_) | Primitive::Image(_))
    }

    pub fn as_polyline(&self) -> Option<&Polyline> {
        match self {
            Primitive::Polyline(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_polyline_mut(&mut self) -> Option<&mut Polyline> {
        match self {
            Primitive::Polyline(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Primitive::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Primitive::Image(i) => Some(i),
            _ => None,
        }
    }
}

/// Distance from a point to a line segment (a→b).
///
/// Zero-length segments degrade to the distance to `a`.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a chain of connected segments.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Bounding box of a point set, `None` when empty.
pub(crate) fn bounds_of_points(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Rotate `v` by `-angle` (into an axis-aligned frame).
pub(crate) fn unrotate(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
}

/// Rotate `v` by `angle`.
pub(crate) fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Lengths of the images of the unit x and y axes under `affine`.
pub(crate) fn axis_scales(affine: Affine) -> Vec2 {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    Vec2::new(a.hypot(b), c.hypot(d))
}
