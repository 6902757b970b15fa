//! Render list: the scene in paint order with styles resolved.
//!
//! The core draws no pixels. A renderer walks [`render_list`] back to front
//! and strokes/fills each [`RenderItem::path`] with the resolved styles.
//! Missing references fall back to the documented defaults and are listed
//! in [`RenderItem::unresolved`] so the host can report them.

use crate::error::SceneError;
use crate::layer::{Layer, LayerId};
use crate::primitives::Primitive;
use crate::scene::Scene;
use crate::shape::{Shape, ShapeId};
use crate::style::{FillStyle, FontStyle, ImageResource, StrokeStyle, StyleResolver};
use kurbo::{Affine, BezPath, Rect};

/// One layer's worth of drawables.
#[derive(Debug, Clone)]
pub struct RenderLayer {
    pub id: LayerId,
    pub name: String,
    pub locked: bool,
    /// Paint order: first item is backmost.
    pub items: Vec<RenderItem>,
}

/// A shape ready to draw.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub shape_id: ShapeId,
    /// Geometry in local coordinates.
    pub primitive: Primitive,
    pub transform: Affine,
    /// Outline in world coordinates.
    pub path: BezPath,
    pub bounds: Option<Rect>,
    pub stroke: Option<StrokeStyle>,
    /// Only present for fillable closed primitives.
    pub fill: Option<FillStyle>,
    pub font: Option<FontStyle>,
    pub image: Option<ImageResource>,
    /// References that fell back to defaults.
    pub unresolved: Vec<SceneError>,
}

impl RenderItem {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

fn resolve_or<T>(
    result: Result<T, SceneError>,
    fallback: impl FnOnce() -> T,
    unresolved: &mut Vec<SceneError>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::debug!("{err}, using fallback");
            unresolved.push(err);
            fallback()
        }
    }
}

/// Resolve a single shape. Used for scene items and tool previews alike.
pub fn render_shape(shape: &Shape, resolver: &dyn StyleResolver) -> RenderItem {
    let mut unresolved = Vec::new();
    let stroke = shape.stroke.as_ref().map(|id| {
        resolve_or(resolver.resolve_stroke(id), StrokeStyle::fallback, &mut unresolved)
    });
    let fill = match (&shape.fill, shape.primitive.is_fillable()) {
        (Some(id), true) => Some(resolve_or(
            resolver.resolve_fill(id),
            FillStyle::fallback,
            &mut unresolved,
        )),
        _ => None,
    };
    let font = shape.primitive.as_text().map(|text| match &text.font {
        Some(id) => resolve_or(resolver.resolve_font(id), FontStyle::fallback, &mut unresolved),
        None => FontStyle::fallback(),
    });
    let image = shape.primitive.as_image().map(|image| {
        resolve_or(
            resolver.resolve_image(&image.image),
            ImageResource::placeholder,
            &mut unresolved,
        )
    });

    let mut path = shape.primitive.to_path();
    path.apply_affine(shape.transform());

    RenderItem {
        shape_id: shape.id(),
        primitive: shape.primitive.clone(),
        transform: shape.transform(),
        path,
        bounds: shape.world_bounds(),
        stroke,
        fill,
        font,
        image,
        unresolved,
    }
}

fn render_layer(layer: &Layer, resolver: &dyn StyleResolver) -> RenderLayer {
    RenderLayer {
        id: layer.id(),
        name: layer.name.clone(),
        locked: layer.locked,
        items: layer
            .iter()
            .filter(|shape| shape.visible)
            .map(|shape| render_shape(shape, resolver))
            .collect(),
    }
}

/// Visible layers in paint order, each with its visible shapes in paint order.
pub fn render_list(scene: &Scene, resolver: &dyn StyleResolver) -> Vec<RenderLayer> {
    scene
        .layers()
        .iter()
        .filter(|layer| layer.visible)
        .map(|layer| render_layer(layer, resolver))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Image, Line, Rectangle, Text};
    use crate::style::{FillRef, FontRef, ImageRef, LinePattern, StrokeRef, StyleLibrary};
    use kurbo::{Point, Size, Vec2};

    #[test]
    fn test_paint_order_and_hidden_skipped() {
        let mut scene = Scene::new();
        let a = scene.add_shape(Shape::new(Primitive::Rectangle(Rectangle::new(
            Point::ZERO,
            10.0,
            10.0,
        ))));
        let mut hidden = Shape::new(Primitive::Line(Line::new(Point::ZERO, Point::new(5.0, 5.0))));
        hidden.visible = false;
        scene.add_shape(hidden);
        let b = scene.add_shape(Shape::new(Primitive::Line(Line::new(
            Point::ZERO,
            Point::new(1.0, 1.0),
        ))));

        let second = scene.add_layer("Hidden");
        scene.add_shape_to(
            second,
            Shape::new(Primitive::Line(Line::new(Point::ZERO, Point::new(2.0, 2.0)))),
        )
        .unwrap();
        scene.layer_mut(second).unwrap().set_visible(false);

        let list = render_list(&scene, &StyleLibrary::new());
        assert_eq!(list.len(), 1);
        let ids: Vec<_> = list[0].items.iter().map(|i| i.shape_id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_resolved_styles() {
        let lib = StyleLibrary::with_defaults();
        let shape = Shape::new(Primitive::Rectangle(Rectangle::new(Point::ZERO, 10.0, 10.0)))
            .with_stroke(StrokeRef::new("pen.hidden"))
            .with_fill(FillRef::new("brush.white"));
        let item = render_shape(&shape, &lib);
        assert!(item.is_fully_resolved());
        assert_eq!(item.stroke.map(|s| s.pattern), Some(LinePattern::Dashed));
        assert!(item.fill.is_some());
    }

    #[test]
    fn test_missing_references_fall_back() {
        let lib = StyleLibrary::new();
        let shape = Shape::new(Primitive::Rectangle(Rectangle::new(Point::ZERO, 10.0, 10.0)))
            .with_stroke(StrokeRef::new("pen.gone"))
            .with_fill(FillRef::new("brush.gone"));
        let item = render_shape(&shape, &lib);
        assert_eq!(item.stroke, Some(StrokeStyle::fallback()));
        assert_eq!(item.fill, Some(FillStyle::fallback()));
        assert_eq!(item.unresolved.len(), 2);
    }

    #[test]
    fn test_open_primitive_has_no_fill() {
        let lib = StyleLibrary::with_defaults();
        let shape = Shape::new(Primitive::Line(Line::new(Point::ZERO, Point::new(5.0, 0.0))))
            .with_fill(FillRef::new("brush.white"));
        assert!(render_shape(&shape, &lib).fill.is_none());
    }

    #[test]
    fn test_text_and_image_resources() {
        let lib = StyleLibrary::new();
        let text = Shape::new(Primitive::Text(
            Text::new(Point::ZERO, "A").with_font(FontRef::new("font.gone")),
        ));
        let item = render_shape(&text, &lib);
        assert_eq!(item.font, Some(FontStyle::fallback()));
        assert_eq!(item.unresolved.len(), 1);

        let image = Shape::new(Primitive::Image(Image::new(
            Point::ZERO,
            Size::new(4.0, 4.0),
            ImageRef::new("img.gone"),
        )));
        let item = render_shape(&image, &lib);
        assert!(item.image.as_ref().is_some_and(|i| i.is_placeholder()));
    }

    #[test]
    fn test_path_is_in_world_space() {
        let mut shape = Shape::new(Primitive::Line(Line::new(Point::ZERO, Point::new(10.0, 0.0))));
        shape.translate(Vec2::new(5.0, 5.0)).unwrap();
        let item = render_shape(&shape, &StyleLibrary::new());
        let bbox = kurbo::Shape::bounding_box(&item.path);
        assert!((bbox.x0 - 5.0).abs() < 1e-9);
        assert!((bbox.y0 - 5.0).abs() < 1e-9);
    }
}
