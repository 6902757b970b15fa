//! Text run primitive.

use super::{Geometry, MIN_EXTENT, PATH_TOLERANCE, Primitive};
use crate::style::FontRef;
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;
/// Line height as a fraction of the font size.
const LINE_HEIGHT: f64 = 1.2;

/// A run of text anchored at its top-left corner.
///
/// Hit-testing uses the estimated layout box; glyph outlines are the
/// renderer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Top-left anchor.
    pub anchor: Point,
    /// Content; `\n` separates lines.
    pub content: String,
    /// Font reference, resolved at render time.
    #[serde(default)]
    pub font: Option<FontRef>,
    /// Font size in world units.
    pub font_size: f64,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    pub fn new(anchor: Point, content: impl Into<String>) -> Self {
        Self {
            anchor,
            content: content.into(),
            font: None,
            font_size: Self::DEFAULT_FONT_SIZE,
        }
    }

    pub fn with_font(mut self, font: FontRef) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Estimated layout box.
    pub fn layout_box(&self) -> Rect {
        let lines = self.content.lines().count().max(1);
        let widest = self
            .content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        Rect::new(
            self.anchor.x,
            self.anchor.y,
            self.anchor.x + widest as f64 * self.font_size * GLYPH_ADVANCE,
            self.anchor.y + lines as f64 * self.font_size * LINE_HEIGHT,
        )
    }
}

impl Geometry for Text {
    fn bounds(&self) -> Option<Rect> {
        Some(self.layout_box())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.layout_box().inflate(tolerance, tolerance).contains(point)
    }

    fn contains_filled(&self, point: Point) -> bool {
        self.layout_box().contains(point)
    }

    fn transformed(&self, affine: Affine) -> Primitive {
        let mut text = self.clone();
        text.anchor = affine * self.anchor;
        text.font_size = self.font_size * affine.determinant().abs().sqrt();
        Primitive::Text(text)
    }

    fn is_finite(&self) -> bool {
        self.anchor.is_finite() && self.font_size.is_finite()
    }

    fn is_degenerate(&self) -> bool {
        self.content.trim().is_empty() || self.font_size < MIN_EXTENT
    }

    fn to_path(&self) -> BezPath {
        self.layout_box().to_path(PATH_TOLERANCE)
    }

    fn anchor_points(&self) -> Vec<Point> {
        vec![self.anchor, self.layout_box().center()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_box() {
        let text = Text::new(Point::new(10.0, 20.0), "abcd").with_size(10.0);
        let b = text.layout_box();
        assert!((b.width() - 24.0).abs() < 1e-9);
        assert!((b.height() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiline_box() {
        let text = Text::new(Point::ZERO, "ab\nabcdef").with_size(10.0);
        let b = text.layout_box();
        assert!((b.width() - 36.0).abs() < 1e-9);
        assert!((b.height() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_box_containment() {
        let text = Text::new(Point::ZERO, "hello").with_size(10.0);
        assert!(text.hit_test(Point::new(15.0, 6.0), 0.0));
        assert!(text.hit_test(Point::new(31.0, 6.0), 2.0));
        assert!(!text.hit_test(Point::new(40.0, 6.0), 2.0));
    }

    #[test]
    fn test_empty_text_is_degenerate() {
        assert!(Text::new(Point::ZERO, "   ").is_degenerate());
        assert!(!Text::new(Point::ZERO, "x").is_degenerate());
    }

    #[test]
    fn test_transform_scales_font() {
        let text = Text::new(Point::new(1.0, 1.0), "x").with_size(10.0);
        let Primitive::Text(scaled) = text.transformed(Affine::scale(2.0)) else {
            panic!("expected text");
        };
        assert_eq!(scaled.anchor, Point::new(2.0, 2.0));
        assert!((scaled.font_size - 20.0).abs() < 1e-9);
    }
}
