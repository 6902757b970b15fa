//! Style references and their resolved values.
//!
//! Shapes only store opaque identifiers ([`StrokeRef`], [`FillRef`],
//! [`FontRef`], [`ImageRef`]). The embedding shell owns the actual pen,
//! brush, font and image managers and exposes them through a
//! [`StyleResolver`], which is passed into rendering and tool calls. A
//! missing definition is never fatal: renderers fall back to the documented
//! defaults below.

use crate::error::{SceneError, SceneResult};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! style_ref {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            fn unresolved(&self) -> SceneError {
                SceneError::UnresolvedStyleReference {
                    kind: Self::KIND,
                    id: self.0.clone(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

style_ref!(
    /// Reference to a pen definition.
    StrokeRef,
    "stroke"
);
style_ref!(
    /// Reference to a brush definition.
    FillRef,
    "fill"
);
style_ref!(
    /// Reference to a font definition.
    FontRef,
    "font"
);
style_ref!(
    /// Reference to an image resource.
    ImageRef,
    "image"
);

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Dash pattern of a pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinePattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LinePattern {
    /// Dash lengths in multiples of the stroke width (empty = solid).
    pub fn dashes(self) -> &'static [f64] {
        match self {
            LinePattern::Solid => &[],
            LinePattern::Dashed => &[4.0, 2.0],
            LinePattern::Dotted => &[1.0, 2.0],
            LinePattern::DashDot => &[4.0, 2.0, 1.0, 2.0],
        }
    }
}

/// Fill pattern of a brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillPattern {
    /// Solid fill color.
    #[default]
    Solid,
    /// Parallel diagonal lines.
    Hatch,
    /// Cross-hatched lines.
    CrossHatch,
    /// Dot pattern.
    Dots,
}

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

/// Image format of a registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A resolved pen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: SerializableColor,
    pub width: f64,
    #[serde(default)]
    pub pattern: LinePattern,
}

impl StrokeStyle {
    pub fn new(color: SerializableColor, width: f64) -> Self {
        Self {
            color,
            width,
            pattern: LinePattern::Solid,
        }
    }

    /// Pen used when a stroke reference cannot be resolved.
    pub fn fallback() -> Self {
        Self::new(SerializableColor::black(), 1.0)
    }

    pub fn color(&self) -> Color {
        self.color.into()
    }
}

/// A resolved brush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub color: SerializableColor,
    #[serde(default)]
    pub pattern: FillPattern,
}

impl FillStyle {
    pub fn solid(color: SerializableColor) -> Self {
        Self {
            color,
            pattern: FillPattern::Solid,
        }
    }

    /// Brush used when a fill reference cannot be resolved.
    pub fn fallback() -> Self {
        Self::solid(SerializableColor::new(128, 128, 128, 128))
    }

    pub fn color(&self) -> Color {
        self.color.into()
    }
}

/// A resolved font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    pub family: String,
    pub size: f64,
    #[serde(default)]
    pub weight: FontWeight,
}

impl FontStyle {
    /// Font used when a font reference cannot be resolved.
    pub fn fallback() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 16.0,
            weight: FontWeight::Regular,
        }
    }
}

/// A resolved image resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResource {
    pub width_px: u32,
    pub height_px: u32,
    pub format: Option<ImageFormat>,
}

impl ImageResource {
    /// Placeholder for a missing image; renderers draw the frame only.
    pub fn placeholder() -> Self {
        Self {
            width_px: 1,
            height_px: 1,
            format: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.format.is_none()
    }
}

/// Lookup interface implemented by the embedding shell's resource managers.
///
/// Resolution is synchronous; asynchronous backends must present a
/// pre-resolved cache.
pub trait StyleResolver {
    fn resolve_stroke(&self, id: &StrokeRef) -> SceneResult<StrokeStyle>;
    fn resolve_fill(&self, id: &FillRef) -> SceneResult<FillStyle>;
    fn resolve_font(&self, id: &FontRef) -> SceneResult<FontStyle>;
    fn resolve_image(&self, id: &ImageRef) -> SceneResult<ImageResource>;
}

/// In-memory style registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleLibrary {
    #[serde(default)]
    strokes: HashMap<StrokeRef, StrokeStyle>,
    #[serde(default)]
    fills: HashMap<FillRef, FillStyle>,
    #[serde(default)]
    fonts: HashMap<FontRef, FontStyle>,
    #[serde(default)]
    images: HashMap<ImageRef, ImageResource>,
}

impl StyleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small library with commonly used pens and brushes.
    pub fn with_defaults() -> Self {
        let mut lib = Self::new();
        lib.add_stroke("pen.default", StrokeStyle::new(SerializableColor::black(), 1.0));
        lib.add_stroke(
            "pen.hidden",
            StrokeStyle {
                pattern: LinePattern::Dashed,
                ..StrokeStyle::new(SerializableColor::new(90, 90, 90, 255), 0.5)
            },
        );
        lib.add_stroke(
            "pen.center",
            StrokeStyle {
                pattern: LinePattern::DashDot,
                ..StrokeStyle::new(SerializableColor::new(200, 0, 0, 255), 0.35)
            },
        );
        lib.add_fill("brush.white", FillStyle::solid(SerializableColor::white()));
        lib.add_fill(
            "brush.section",
            FillStyle {
                color: SerializableColor::black(),
                pattern: FillPattern::Hatch,
            },
        );
        lib.add_font("font.default", FontStyle::fallback());
        lib
    }

    pub fn add_stroke(&mut self, id: impl Into<StrokeRef>, style: StrokeStyle) -> StrokeRef {
        let id = id.into();
        self.strokes.insert(id.clone(), style);
        id
    }

    pub fn add_fill(&mut self, id: impl Into<FillRef>, style: FillStyle) -> FillRef {
        let id = id.into();
        self.fills.insert(id.clone(), style);
        id
    }

    pub fn add_font(&mut self, id: impl Into<FontRef>, style: FontStyle) -> FontRef {
        let id = id.into();
        self.fonts.insert(id.clone(), style);
        id
    }

    pub fn add_image(&mut self, id: impl Into<ImageRef>, resource: ImageResource) -> ImageRef {
        let id = id.into();
        self.images.insert(id.clone(), resource);
        id
    }

    /// Register raw image bytes, detecting the format from magic bytes.
    ///
    /// Returns `None` when the format is not recognised.
    pub fn add_image_bytes(
        &mut self,
        id: impl Into<ImageRef>,
        data: &[u8],
        width_px: u32,
        height_px: u32,
    ) -> Option<ImageRef> {
        let format = ImageFormat::from_magic_bytes(data)?;
        Some(self.add_image(
            id,
            ImageResource {
                width_px,
                height_px,
                format: Some(format),
            },
        ))
    }

    pub fn remove_stroke(&mut self, id: &StrokeRef) -> Option<StrokeStyle> {
        self.strokes.remove(id)
    }

    pub fn remove_fill(&mut self, id: &FillRef) -> Option<FillStyle> {
        self.fills.remove(id)
    }

    pub fn remove_font(&mut self, id: &FontRef) -> Option<FontStyle> {
        self.fonts.remove(id)
    }

    pub fn remove_image(&mut self, id: &ImageRef) -> Option<ImageResource> {
        self.images.remove(id)
    }
}

impl StyleResolver for StyleLibrary {
    fn resolve_stroke(&self, id: &StrokeRef) -> SceneResult<StrokeStyle> {
        self.strokes.get(id).cloned().ok_or_else(|| id.unresolved())
    }

    fn resolve_fill(&self, id: &FillRef) -> SceneResult<FillStyle> {
        self.fills.get(id).cloned().ok_or_else(|| id.unresolved())
    }

    fn resolve_font(&self, id: &FontRef) -> SceneResult<FontStyle> {
        self.fonts.get(id).cloned().ok_or_else(|| id.unresolved())
    }

    fn resolve_image(&self, id: &ImageRef) -> SceneResult<ImageResource> {
        self.images.get(id).cloned().ok_or_else(|| id.unresolved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_registered() {
        let lib = StyleLibrary::with_defaults();
        let pen = lib.resolve_stroke(&StrokeRef::new("pen.hidden")).unwrap();
        assert_eq!(pen.pattern, LinePattern::Dashed);
    }

    #[test]
    fn test_missing_reference_reports_kind_and_id() {
        let lib = StyleLibrary::new();
        let err = lib.resolve_fill(&FillRef::new("brush.gone")).unwrap_err();
        assert_eq!(
            err,
            SceneError::UnresolvedStyleReference {
                kind: "fill",
                id: "brush.gone".to_string()
            }
        );
    }

    #[test]
    fn test_add_image_bytes() {
        let mut lib = StyleLibrary::new();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        let id = lib.add_image_bytes("logo", &png, 64, 32).unwrap();
        let res = lib.resolve_image(&id).unwrap();
        assert_eq!(res.format, Some(ImageFormat::Png));
        assert!(lib.add_image_bytes("junk", b"nope", 1, 1).is_none());
    }

    #[test]
    fn test_refs_serialize_as_plain_strings() {
        let json = serde_json::to_string(&StrokeRef::new("pen.default")).unwrap();
        assert_eq!(json, "\"pen.default\"");
    }

    #[test]
    fn test_color_roundtrip_through_peniko() {
        let color = SerializableColor::new(10, 20, 30, 255);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }

    #[test]
    fn test_image_format_detection() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
    }
}
