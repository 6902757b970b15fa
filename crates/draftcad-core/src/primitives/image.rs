//! Image frame primitive.

use super::{Geometry, MIN_EXTENT, PATH_TOLERANCE, Primitive};
use crate::style::ImageRef;
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// A frame that displays an externally managed raster image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Top-left corner position.
    pub origin: Point,
    /// Display size.
    pub size: Size,
    /// Image resource reference.
    pub image: ImageRef,
}

impl Image {
    pub fn new(origin: Point, size: Size, image: ImageRef) -> Self {
        Self {
            origin,
            size,
            image,
        }
    }

    /// Frame spanning two opposite corners.
    pub fn from_corners(p1: Point, p2: Point, image: ImageRef) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self::new(rect.origin(), rect.size(), image)
    }

    pub fn frame(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// Shrink the frame to `width_px / height_px` while keeping its origin.
    ///
    /// A collapsed side is derived from the other one.
    pub fn fit_aspect(&mut self, width_px: u32, height_px: u32) {
        if width_px == 0 || height_px == 0 {
            return;
        }
        let aspect = width_px as f64 / height_px as f64;
        if self.size.height < MIN_EXTENT {
            self.size.height = self.size.width / aspect;
        } else if self.size.width < MIN_EXTENT {
            self.size.width = self.size.height * aspect;
        } else if self.size.width / self.size.height > aspect {
            self.size.width = self.size.height * aspect;
        } else {
            self.size.height = self.size.width / aspect;
        }
    }
}

impl Geometry for Image {
    fn bounds(&self) -> Option<Rect> {
        Some(self.frame())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.frame().inflate(tolerance, tolerance).contains(point)
    }

    fn contains_filled(&self, point: Point) -> bool {
        self.frame().contains(point)
    }

    /// Rotation is not representable on a frame; the mapped frame's bounding
    /// box is used.
    fn transformed(&self, affine: Affine) -> Primitive {
        let frame = affine.transform_rect_bbox(self.frame());
        Primitive::Image(Image::new(frame.origin(), frame.size(), self.image.clone()))
    }

    fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.size.width.is_finite() && self.size.height.is_finite()
    }

    fn is_degenerate(&self) -> bool {
        self.size.width < MIN_EXTENT || self.size.height < MIN_EXTENT
    }

    fn to_path(&self) -> BezPath {
        self.frame().to_path(PATH_TOLERANCE)
    }

    fn anchor_points(&self) -> Vec<Point> {
        let f = self.frame();
        vec![
            Point::new(f.x0, f.y0),
            Point::new(f.x1, f.y0),
            Point::new(f.x1, f.y1),
            Point::new(f.x0, f.y1),
            f.center(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> Image {
        Image::from_corners(Point::new(40.0, 30.0), Point::ZERO, ImageRef::new("photo"))
    }

    #[test]
    fn test_from_corners_normalizes() {
        let img = photo();
        assert_eq!(img.origin, Point::ZERO);
        assert_eq!(img.size, Size::new(40.0, 30.0));
    }

    #[test]
    fn test_hit_test_frame() {
        let img = photo();
        assert!(img.hit_test(Point::new(20.0, 15.0), 0.0));
        assert!(img.hit_test(Point::new(41.0, 15.0), 2.0));
        assert!(!img.hit_test(Point::new(50.0, 15.0), 2.0));
    }

    #[test]
    fn test_fit_aspect() {
        let mut img = Image::new(Point::ZERO, Size::new(100.0, 100.0), ImageRef::new("wide"));
        img.fit_aspect(200, 100);
        assert!((img.size.width - 100.0).abs() < 1e-9);
        assert!((img.size.height - 50.0).abs() < 1e-9);

        let mut flat = Image::new(Point::ZERO, Size::new(30.0, 0.0), ImageRef::new("wide"));
        flat.fit_aspect(200, 100);
        assert!((flat.size.height - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_transformed_keeps_reference() {
        let Primitive::Image(moved) = photo().transformed(Affine::translate((5.0, 0.0))) else {
            panic!("expected an image");
        };
        assert_eq!(moved.origin, Point::new(5.0, 0.0));
        assert_eq!(moved.image, ImageRef::new("photo"));
    }
}
