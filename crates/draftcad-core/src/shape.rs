//! The interactive drawing entity.

use crate::error::{SceneError, SceneResult};
use crate::layer::LayerId;
use crate::primitives::{Geometry, Polyline, Primitive};
use crate::style::{FillRef, StrokeRef};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// A primitive placed in the scene with a transform and style references.
///
/// The `layer` field is a non-owning back-reference maintained by
/// [`crate::layer::Layer`] and [`crate::scene::Scene`]; it is rewritten
/// whenever the shape moves between layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    /// Geometry in local coordinates.
    pub primitive: Primitive,
    transform: Affine,
    /// Pen reference (`None` = no stroke).
    #[serde(default)]
    pub stroke: Option<StrokeRef>,
    /// Brush reference (`None` = no fill).
    #[serde(default)]
    pub fill: Option<FillRef>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub(crate) layer: LayerId,
    /// Optional user label.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Shape {
    /// Create a shape with an identity transform and no styles.
    pub fn new(primitive: Primitive) -> Self {
        Self {
            id: Uuid::new_v4(),
            primitive,
            transform: Affine::IDENTITY,
            stroke: None,
            fill: None,
            visible: true,
            locked: false,
            layer: LayerId::nil(),
            name: None,
        }
    }

    /// Create a shape from a finished construction, rejecting degenerate geometry.
    pub fn from_construction(primitive: Primitive) -> SceneResult<Self> {
        if primitive.is_degenerate() {
            return Err(SceneError::DegenerateGeometry(primitive.kind()));
        }
        Ok(Self::new(primitive))
    }

    pub fn with_stroke(mut self, stroke: StrokeRef) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_fill(mut self, fill: FillRef) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Owning layer (nil until the shape is added to one).
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Replace the transform. Only finiteness is validated.
    pub fn set_transform(&mut self, transform: Affine) -> SceneResult<()> {
        if !transform.is_finite() {
            return Err(SceneError::NonFiniteTransform);
        }
        self.transform = transform;
        Ok(())
    }

    /// Pre-compose a world-space transform.
    pub fn apply_transform(&mut self, affine: Affine) -> SceneResult<()> {
        self.set_transform(affine * self.transform)
    }

    pub fn translate(&mut self, delta: Vec2) -> SceneResult<()> {
        self.apply_transform(Affine::translate(delta))
    }

    pub fn rotate_about(&mut self, angle: f64, center: Point) -> SceneResult<()> {
        self.apply_transform(Affine::rotate_about(angle, center))
    }

    pub fn scale_about(&mut self, sx: f64, sy: f64, center: Point) -> SceneResult<()> {
        let to_origin = Affine::translate(-center.to_vec2());
        let back = Affine::translate(center.to_vec2());
        self.apply_transform(back * Affine::scale_non_uniform(sx, sy) * to_origin)
    }

    pub fn set_stroke_style(&mut self, stroke: Option<StrokeRef>) {
        self.stroke = stroke;
    }

    pub fn set_fill_style(&mut self, fill: Option<FillRef>) {
        self.fill = fill;
    }

    /// Whether `point` (world coordinates) hits this shape.
    ///
    /// Outlines are tested in world space so the tolerance stays isotropic
    /// under non-uniform scale. Text and image boxes are tested as the mapped
    /// quadrilateral of their local box. A filled shape also hits anywhere
    /// inside its interior.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.transform.determinant().abs() < f64::EPSILON {
            return false;
        }
        match &self.primitive {
            Primitive::Text(_) | Primitive::Image(_) => {
                let Some(local) = self.primitive.bounds() else {
                    return false;
                };
                let corners = [
                    Point::new(local.x0, local.y0),
                    Point::new(local.x1, local.y0),
                    Point::new(local.x1, local.y1),
                    Point::new(local.x0, local.y1),
                ];
                let frame =
                    Polyline::closed(corners.iter().map(|p| self.transform * *p).collect());
                frame.contains_filled(point) || frame.hit_test(point, tolerance)
            }
            _ => {
                let world = self.world_primitive();
                world.hit_test(point, tolerance)
                    || (self.fill.is_some() && world.contains_filled(point))
            }
        }
    }

    /// Bounds in world coordinates.
    ///
    /// All four corners of the local box are mapped, so rotated shapes are
    /// bounded correctly.
    pub fn world_bounds(&self) -> Option<Rect> {
        self.primitive
            .bounds()
            .map(|local| self.transform.transform_rect_bbox(local))
    }

    /// Geometry mapped into world coordinates.
    pub fn world_primitive(&self) -> Primitive {
        if self.transform == Affine::IDENTITY {
            return self.primitive.clone();
        }
        self.primitive.transformed(self.transform)
    }

    /// Fold the transform into the primitive and reset it to identity.
    pub fn bake_transform(&mut self) {
        self.primitive = self.world_primitive();
        self.transform = Affine::IDENTITY;
    }

    /// Copy with a fresh identifier; style references are shared.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Ellipse, Line, Rectangle, Text};
    use std::f64::consts::FRAC_PI_2;

    fn line() -> Shape {
        Shape::new(Primitive::Line(Line::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        )))
    }

    #[test]
    fn test_from_construction_rejects_degenerate() {
        let zero = Primitive::Line(Line::new(Point::ZERO, Point::ZERO));
        assert_eq!(
            Shape::from_construction(zero).unwrap_err(),
            SceneError::DegenerateGeometry(crate::primitives::PrimitiveKind::Line)
        );
    }

    #[test]
    fn test_hit_test_through_transform() {
        let mut shape = line();
        shape.translate(Vec2::new(100.0, 50.0)).unwrap();
        assert!(shape.hit_test(Point::new(105.0, 50.0), 0.5));
        assert!(!shape.hit_test(Point::new(5.0, 0.0), 0.5));
    }

    #[test]
    fn test_transform_consistency_under_rigid_motion() {
        let mut shape = Shape::new(Primitive::Ellipse(Ellipse::new(
            Point::new(3.0, 4.0),
            20.0,
            8.0,
        )));
        shape.set_transform(Affine::rotate(0.4)).unwrap();
        let queries = [
            Point::new(20.0, 15.0),
            Point::new(-10.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
        ];
        let motion = Affine::translate((-42.0, 17.0)) * Affine::rotate(1.3);
        let before: Vec<bool> = queries.iter().map(|q| shape.hit_test(*q, 1.5)).collect();
        shape.apply_transform(motion).unwrap();
        let after: Vec<bool> = queries
            .iter()
            .map(|q| shape.hit_test(motion * *q, 1.5))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_world_bounds_of_rotated_box() {
        let mut shape = Shape::new(Primitive::Rectangle(Rectangle::new(
            Point::new(-5.0, -1.0),
            10.0,
            2.0,
        )));
        shape.rotate_about(FRAC_PI_2, Point::ZERO).unwrap();
        let b = shape.world_bounds().unwrap();
        assert!((b.x0 + 1.0).abs() < 1e-9);
        assert!((b.x1 - 1.0).abs() < 1e-9);
        assert!((b.y0 + 5.0).abs() < 1e-9);
        assert!((b.y1 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_transform_rejected() {
        let mut shape = line();
        let err = shape
            .set_transform(Affine::translate((f64::INFINITY, 0.0)))
            .unwrap_err();
        assert_eq!(err, SceneError::NonFiniteTransform);
        assert_eq!(shape.transform(), Affine::IDENTITY);
    }

    #[test]
    fn test_fill_reference_enables_interior_hits() {
        let rect = Shape::new(Primitive::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0)));
        assert!(!rect.hit_test(Point::new(50.0, 50.0), 1.0));
        let filled = rect.with_fill(FillRef::new("brush.white"));
        assert!(filled.hit_test(Point::new(50.0, 50.0), 1.0));
    }

    #[test]
    fn test_tolerance_scales_with_transform() {
        let mut shape = line();
        shape.scale_about(4.0, 4.0, Point::ZERO).unwrap();
        // 2 world units away from the scaled line is 0.5 local units.
        assert!(shape.hit_test(Point::new(20.0, 2.0), 2.5));
        assert!(!shape.hit_test(Point::new(20.0, 4.0), 2.5));
    }

    #[test]
    fn test_tolerance_is_isotropic_under_non_uniform_scale() {
        let mut rect = Shape::new(Primitive::Rectangle(Rectangle::new(Point::ZERO, 100.0, 10.0)));
        rect.scale_about(1.0, 10.0, Point::ZERO).unwrap();
        // World outline is (0,0)-(100,100).
        assert!(!rect.hit_test(Point::new(50.0, -20.0), 8.0));
        assert!(rect.hit_test(Point::new(50.0, -5.0), 8.0));
        assert!(rect.hit_test(Point::new(-5.0, 50.0), 8.0));
        assert!(!rect.hit_test(Point::new(-20.0, 50.0), 8.0));

        let mut stretched = line();
        stretched.set_transform(Affine::scale_non_uniform(1.0, 10.0)).unwrap();
        assert!(!stretched.hit_test(Point::new(5.0, 25.0), 8.0));
        assert!(stretched.hit_test(Point::new(5.0, 7.0), 8.0));
    }

    #[test]
    fn test_rotated_text_box_hits_mapped_quad() {
        let text = Text::new(Point::ZERO, "NOTE").with_size(10.0);
        let local = text.layout_box();
        let mut shape = Shape::new(Primitive::Text(text));
        shape.rotate_about(FRAC_PI_2, Point::ZERO).unwrap();
        let inside = Affine::rotate(FRAC_PI_2) * local.center();
        assert!(shape.hit_test(inside, 0.0));
        // The unrotated box centre is outside the rotated quad.
        assert!(!shape.hit_test(local.center(), 0.5));
    }

    #[test]
    fn test_duplicate_gets_fresh_id_and_shares_styles() {
        let shape = line().with_stroke(StrokeRef::new("pen.default"));
        let copy = shape.duplicate();
        assert_ne!(copy.id(), shape.id());
        assert_eq!(copy.stroke, shape.stroke);
        assert_eq!(copy.primitive, shape.primitive);
    }

    #[test]
    fn test_bake_transform() {
        let mut shape = line();
        shape.translate(Vec2::new(0.0, 5.0)).unwrap();
        let before = shape.world_bounds();
        shape.bake_transform();
        assert_eq!(shape.transform(), Affine::IDENTITY);
        assert_eq!(shape.world_bounds(), before);
    }
}
