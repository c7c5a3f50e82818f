//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Encode → PNG | `image::ImageBuffer::write_to` |
//! | Shrink before drawing | `image::imageops::resize` (Lanczos3 or Triangle) |
//! | Draw at fractional offset | inverse mapping + bilinear sampling |
//! | Per-pixel filters | row-parallel with `rayon` |
//!
//! Drawing works backwards from the canvas: each output pixel center is
//! mapped into source space and sampled, so the cost depends on the canvas
//! size, not on how far the source is scaled up. When the source has to
//! shrink it is resized first so no source pixels are skipped.

use super::backend::{BackendError, ImageBackend, RasterImage};
use super::calculations::DrawRect;
use super::params::{AdjustmentParameters, CropParams, RenderParams, Resampling, Threshold};
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_for(resampling: Resampling) -> FilterType {
    match resampling {
        Resampling::Fast => FilterType::Triangle,
        Resampling::Quality => FilterType::Lanczos3,
    }
}

/// Bilinear sample with transparent black outside the image.
///
/// Taps are interpolated premultiplied, so a half-covered edge pixel keeps
/// the color of its opaque neighbor instead of fading toward black.
fn bilinear_sample(img: &RgbaImage, x: f32, y: f32) -> [f32; 4] {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |sx: i64, sy: i64| -> [f32; 4] {
        if sx < 0 || sy < 0 || sx >= img.width() as i64 || sy >= img.height() as i64 {
            [0.0; 4]
        } else {
            let p = img.get_pixel(sx as u32, sy as u32);
            let a = p[3] as f32 / 255.0;
            [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
        }
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0.0; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        out[c] = lerp(top, bot, fy);
    }

    let alpha = out[3] / 255.0;
    if alpha <= f32::EPSILON {
        return [0.0; 4];
    }
    for c in &mut out[..3] {
        *c /= alpha;
    }
    out
}

/// Draw the whole of `src` into `rect` on a transparent `canvas`.
fn draw_scaled(
    src: &RgbaImage,
    canvas: (u32, u32),
    rect: &DrawRect,
    resampling: Resampling,
) -> Result<RgbaImage, BackendError> {
    let (cw, ch) = canvas;
    let stride = cw as usize * 4;
    let mut raw = vec![0u8; stride * ch as usize];

    let drawable = rect.width.is_finite()
        && rect.height.is_finite()
        && rect.x.is_finite()
        && rect.y.is_finite()
        && rect.width > 0.0
        && rect.height > 0.0;

    if drawable {
        let shrunk;
        let source = if rect.width < src.width() as f64 || rect.height < src.height() as f64 {
            let w = (rect.width.round() as u32).clamp(1, src.width());
            let h = (rect.height.round() as u32).clamp(1, src.height());
            shrunk = image::imageops::resize(src, w, h, filter_for(resampling));
            &shrunk
        } else {
            src
        };

        let step_x = source.width() as f64 / rect.width;
        let step_y = source.height() as f64 / rect.height;
        let (max_x, max_y) = (source.width() as f64, source.height() as f64);

        raw.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row_out)| {
                let sy = (y as f64 + 0.5 - rect.y) * step_y - 0.5;
                if sy <= -1.0 || sy >= max_y {
                    return;
                }
                for x in 0..cw as usize {
                    let sx = (x as f64 + 0.5 - rect.x) * step_x - 0.5;
                    if sx <= -1.0 || sx >= max_x {
                        continue;
                    }
                    let p = bilinear_sample(source, sx as f32, sy as f32);
                    let pi = x * 4;
                    for c in 0..4 {
                        row_out[pi + c] = p[c].round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
    }

    RgbaImage::from_raw(cw, ch, raw)
        .ok_or_else(|| BackendError::ProcessingFailed("canvas buffer size mismatch".into()))
}

/// Brightness multiplier, then contrast around mid-gray, on a 0-255 channel.
///
/// Both steps work on normalized values and clamp to `[0, 1]` after each.
pub fn adjust_channel(value: u8, brightness: f64, contrast: f64) -> u8 {
    let v = (value as f64 / 255.0 * brightness).clamp(0.0, 1.0);
    let v = ((v - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
    (v * 255.0).round() as u8
}

fn apply_filters(img: &mut RgbaImage, adjustments: &AdjustmentParameters) {
    if adjustments.brightness == 1.0 && adjustments.contrast == 1.0 {
        return;
    }
    let (b, k) = (adjustments.brightness, adjustments.contrast);
    let stride = img.width() as usize * 4;
    let raw: &mut [u8] = img;
    raw.par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            if px[3] == 0 {
                continue;
            }
            for c in &mut px[..3] {
                *c = adjust_channel(*c, b, k);
            }
        }
    });
}

/// Whether pixel `(x, y)` has its center inside the circle inscribed in a
/// `size × size` square.
pub fn inside_circle(x: u32, y: u32, size: u32) -> bool {
    let r = size as f64 / 2.0;
    let dx = x as f64 + 0.5 - r;
    let dy = y as f64 + 0.5 - r;
    dx * dx + dy * dy <= r * r
}

/// Clear every pixel outside the inscribed circle of a square image.
pub fn apply_circular_mask(img: &mut RgbaImage) {
    let size = img.width();
    for (x, y, p) in img.enumerate_pixels_mut() {
        if !inside_circle(x, y, size) {
            *p = Rgba([0, 0, 0, 0]);
        }
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        RasterImage::new(decoded.to_rgba8())
    }

    fn encode_png(&self, image: &RasterImage) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        image
            .pixels()
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn circular_crop(
        &self,
        image: &RasterImage,
        params: &CropParams,
    ) -> Result<RasterImage, BackendError> {
        let size = params.target_size;
        let mut canvas = draw_scaled(
            image.pixels(),
            (size, size),
            &params.transform.draw,
            Resampling::Quality,
        )?;
        apply_circular_mask(&mut canvas);
        RasterImage::new(canvas)
    }

    fn render(
        &self,
        image: &RasterImage,
        params: &RenderParams,
    ) -> Result<RasterImage, BackendError> {
        let mut canvas = draw_scaled(
            image.pixels(),
            (params.canvas_width, params.canvas_height),
            &params.draw,
            params.resampling,
        )?;
        apply_filters(&mut canvas, &params.adjustments);
        RasterImage::new(canvas)
    }

    fn remove_background(
        &self,
        image: &RasterImage,
        threshold: Threshold,
    ) -> Result<RasterImage, BackendError> {
        let t = threshold.value();
        let mut out = image.pixels().clone();
        let stride = out.width() as usize * 4;
        let raw: &mut [u8] = &mut out;
        raw.par_chunks_mut(stride).for_each(|row| {
            for px in row.chunks_exact_mut(4) {
                if px[0] > t && px[1] > t && px[2] > t {
                    px[3] = 0;
                }
            }
        });
        RasterImage::new(out)
    }
}
