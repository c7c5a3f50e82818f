//! Profile photo hand-off to the document renderer.
//!
//! The resume export draws whatever [`ExportAvatar`] the session hands it:
//! the circular thumbnail when a photo is loaded, otherwise a neutral
//! placeholder: a person silhouette on a disc, masked exactly like a real
//! thumbnail.

use crate::imaging::rust_backend::apply_circular_mask;
use crate::imaging::{BackendError, ImageBackend, RasterImage};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Fill color of the placeholder disc (dark slate blue).
pub const PLACEHOLDER_COLOR: [u8; 3] = [52, 73, 94];

/// Color of the silhouette drawn on the placeholder disc (light gray).
pub const SILHOUETTE_COLOR: [u8; 3] = [189, 195, 199];

/// What the renderer draws in the photo slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportAvatar<'a> {
    Thumbnail(&'a RasterImage),
    Placeholder,
}

impl ExportAvatar<'_> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ExportAvatar::Placeholder)
    }

    /// Pixels for a `size × size` slot.
    ///
    /// A thumbnail of a different size is resampled to fit.
    pub fn to_raster(&self, size: u32) -> Result<RasterImage, BackendError> {
        match self {
            ExportAvatar::Thumbnail(thumbnail) if thumbnail.dimensions() == (size, size) => {
                Ok((*thumbnail).clone())
            }
            ExportAvatar::Thumbnail(thumbnail) => RasterImage::new(imageops::resize(
                thumbnail.pixels(),
                size,
                size,
                FilterType::Lanczos3,
            )),
            ExportAvatar::Placeholder => placeholder_avatar(size),
        }
    }

    /// PNG bytes for a `size × size` slot.
    pub fn to_png(
        &self,
        backend: &impl ImageBackend,
        size: u32,
    ) -> Result<Vec<u8>, BackendError> {
        backend.encode_png(&self.to_raster(size)?)
    }
}

/// Opaque [`PLACEHOLDER_COLOR`] disc with a [`SILHOUETTE_COLOR`] head and
/// shoulders, on a transparent square.
pub fn placeholder_avatar(size: u32) -> Result<RasterImage, BackendError> {
    let disc = Rgba(opaque(PLACEHOLDER_COLOR));
    let glyph = Rgba(opaque(SILHOUETTE_COLOR));
    let mut canvas = RgbaImage::from_fn(size, size, |x, y| {
        if in_silhouette(x, y, size) { glyph } else { disc }
    });
    apply_circular_mask(&mut canvas);
    RasterImage::new(canvas)
}

fn opaque([r, g, b]: [u8; 3]) -> [u8; 4] {
    [r, g, b, 255]
}

/// Round head above an elliptical torso, both centered horizontally.
/// Proportions are relative to the canvas edge.
fn in_silhouette(x: u32, y: u32, size: u32) -> bool {
    let s = size as f64;
    let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
    let cx = s / 2.0;

    let (hx, hy, hr) = (px - cx, py - 0.40 * s, 0.17 * s);
    let head = hx * hx + hy * hy <= hr * hr;

    let (ex, ey) = ((px - cx) / (0.32 * s), (py - 0.92 * s) / (0.28 * s));
    let torso = ex * ex + ey * ey <= 1.0;

    head || torso
}
