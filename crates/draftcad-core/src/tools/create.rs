//! Single-gesture construction: press, drag, release.

use super::ToolKind;
use crate::primitives::{Arc, Ellipse, Image, Line, Primitive, Rectangle, Text};
use crate::snap::snap_line_endpoint;
use crate::style::{FontRef, ImageRef};
use kurbo::{Point, Rect};
use std::f64::consts::TAU;

/// Parameters captured when a construction begins, so the provisional
/// geometry can be rebuilt without the tool context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateParams {
    pub corner_radius: f64,
    pub angle_snap: bool,
    pub text_content: String,
    pub text_size: f64,
    pub font: Option<FontRef>,
    pub image: Option<ImageRef>,
}

/// A drag in progress for Line, Rectangle, Ellipse, Arc, Text or Image.
#[derive(Debug, Clone, PartialEq)]
pub struct DragConstruction {
    pub kind: ToolKind,
    pub start: Point,
    pub current: Point,
    pub params: CreateParams,
}

impl DragConstruction {
    pub fn new(kind: ToolKind, start: Point, params: CreateParams) -> Self {
        Self {
            kind,
            start,
            current: start,
            params,
        }
    }

    /// Move the free end of the gesture.
    pub fn update(&mut self, point: Point) {
        self.current = point;
    }

    /// Provisional geometry for the current gesture.
    pub fn primitive(&self) -> Option<Primitive> {
        build_primitive(self.kind, self.start, self.current, &self.params)
    }
}

/// Build the primitive a drag tool produces between `start` and `end`.
pub fn build_primitive(
    kind: ToolKind,
    start: Point,
    end: Point,
    params: &CreateParams,
) -> Option<Primitive> {
    let primitive = match kind {
        ToolKind::Line => {
            let end = if params.angle_snap {
                snap_line_endpoint(start, end).point
            } else {
                end
            };
            Primitive::Line(Line::new(start, end))
        }
        ToolKind::Rectangle => Primitive::Rectangle(
            Rectangle::from_corners(start, end).with_corner_radius(params.corner_radius),
        ),
        ToolKind::Ellipse => Primitive::Ellipse(Ellipse::from_rect(Rect::from_points(start, end))),
        ToolKind::Arc => {
            let delta = end - start;
            let sweep = delta.y.atan2(delta.x).rem_euclid(TAU);
            Primitive::Arc(Arc::new(start, delta.hypot(), 0.0, sweep))
        }
        ToolKind::Text => {
            let mut text = Text::new(start, params.text_content.clone()).with_size(params.text_size);
            text.font = params.font.clone();
            Primitive::Text(text)
        }
        ToolKind::Image => {
            let image = params.image.clone()?;
            Primitive::Image(Image::from_corners(start, end, image))
        }
        ToolKind::Select | ToolKind::Polyline => return None,
    };
    Some(primitive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn params() -> CreateParams {
        CreateParams {
            text_content: "A".to_string(),
            text_size: 10.0,
            ..CreateParams::default()
        }
    }

    #[test]
    fn test_line_gesture() {
        let mut drag = DragConstruction::new(ToolKind::Line, Point::ZERO, params());
        drag.update(Point::new(10.0, 0.0));
        assert_eq!(
            drag.primitive(),
            Some(Primitive::Line(Line::new(Point::ZERO, Point::new(10.0, 0.0))))
        );
    }

    #[test]
    fn test_line_angle_snap() {
        let p = CreateParams {
            angle_snap: true,
            ..params()
        };
        let Some(Primitive::Line(line)) =
            build_primitive(ToolKind::Line, Point::ZERO, Point::new(100.0, 4.0), &p)
        else {
            panic!("expected a line");
        };
        assert!(line.end.y.abs() < 1e-9);
    }

    #[test]
    fn test_rectangle_any_drag_direction() {
        let Some(Primitive::Rectangle(rect)) = build_primitive(
            ToolKind::Rectangle,
            Point::new(10.0, 10.0),
            Point::new(0.0, 5.0),
            &params(),
        ) else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.as_rect(), Rect::new(0.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn test_arc_gesture_sweeps_from_zero() {
        let Some(Primitive::Arc(arc)) =
            build_primitive(ToolKind::Arc, Point::ZERO, Point::new(0.0, 5.0), &params())
        else {
            panic!("expected an arc");
        };
        assert!((arc.radii.x - 5.0).abs() < 1e-12);
        assert!((arc.start_angle).abs() < 1e-12);
        assert!((arc.sweep_angle - FRAC_PI_2).abs() < 1e-12);

        // Negative angles wrap into [0, 2π).
        let Some(Primitive::Arc(arc)) =
            build_primitive(ToolKind::Arc, Point::ZERO, Point::new(0.0, -5.0), &params())
        else {
            panic!("expected an arc");
        };
        assert!((arc.sweep_angle - 3.0 * FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_image_needs_reference() {
        assert!(
            build_primitive(ToolKind::Image, Point::ZERO, Point::new(5.0, 5.0), &params()).is_none()
        );
        let p = CreateParams {
            image: Some(ImageRef::new("logo")),
            ..params()
        };
        assert!(build_primitive(ToolKind::Image, Point::ZERO, Point::new(5.0, 5.0), &p).is_some());
    }

    #[test]
    fn test_select_builds_nothing() {
        assert!(build_primitive(ToolKind::Select, Point::ZERO, Point::new(5.0, 5.0), &params()).is_none());
    }
}
