//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: decode, encode, circular crop, adjusted render and background
//! removal.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a recording mock so session logic can be checked
//! without pixel work.

use super::params::{CropParams, RenderParams, Threshold};
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image has no pixels ({width}x{height})")]
    Degenerate { width: u32, height: u32 },
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Decoded RGBA8 image with non-zero dimensions.
///
/// Never mutated after construction; operations return new images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Wrap a pixel buffer, rejecting zero-sized images.
    pub fn new(pixels: RgbaImage) -> Result<Self, BackendError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(BackendError::Degenerate { width, height });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Trait for image processing backends.
///
/// Every backend implements all operations so the rest of the codebase is
/// backend-agnostic. Implementations must not mutate their inputs.
pub trait ImageBackend: Sync {
    /// Decode an encoded image (PNG, JPEG, ...) into RGBA8.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError>;

    /// Encode as PNG, preserving alpha.
    fn encode_png(&self, image: &RasterImage) -> Result<Vec<u8>, BackendError>;

    /// Draw the image per `params.transform` onto a square transparent canvas
    /// and mask everything outside the inscribed circle.
    fn circular_crop(
        &self,
        image: &RasterImage,
        params: &CropParams,
    ) -> Result<RasterImage, BackendError>;

    /// Draw the image per `params.draw` with brightness then contrast applied.
    fn render(&self, image: &RasterImage, params: &RenderParams)
    -> Result<RasterImage, BackendError>;

    /// Make near-white pixels fully transparent.
    fn remove_background(
        &self,
        image: &RasterImage,
        threshold: Threshold,
    ) -> Result<RasterImage, BackendError>;
}
