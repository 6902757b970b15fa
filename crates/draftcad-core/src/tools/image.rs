//! Image placement: the frame's resource must resolve before commit.

use crate::error::SceneResult;
use crate::primitives::{Image, MIN_EXTENT};
use crate::style::StyleResolver;
use kurbo::Size;

/// Resolve the frame's image reference.
///
/// A click without a drag places the image at its native pixel size (one
/// world unit per pixel); a dragged frame is shrunk to the image's aspect
/// ratio. Resolution failures are returned to the caller, which cancels the
/// construction.
pub fn resolve_frame(mut frame: Image, resolver: &dyn StyleResolver) -> SceneResult<Image> {
    let resource = resolver.resolve_image(&frame.image)?;
    if frame.size.width < MIN_EXTENT && frame.size.height < MIN_EXTENT {
        frame.size = Size::new(resource.width_px as f64, resource.height_px as f64);
    } else {
        frame.fit_aspect(resource.width_px, resource.height_px);
    }
    Ok(frame)
}
