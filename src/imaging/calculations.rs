//! Pure calculation functions for crop and render geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Coordinates are `f64` pixels in source-image space unless noted.

use crate::detect::BoundingBox;

/// Area of interest used to center the circular crop.
///
/// `x`/`y` are the *center* of the region, not its top-left corner. The
/// center may sit outside the image when a detector box touches an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SubjectRegion {
    /// Centered region spanning half of each image dimension.
    pub fn centered(image: (u32, u32)) -> Self {
        let (w, h) = (image.0 as f64, image.1 as f64);
        Self {
            x: w / 2.0,
            y: h / 2.0,
            width: w / 2.0,
            height: h / 2.0,
        }
    }

    /// Convert a top-left + size detector box to center + size.
    pub fn from_box(bbox: &BoundingBox) -> Self {
        Self {
            x: bbox.x + bbox.width / 2.0,
            y: bbox.y + bbox.height / 2.0,
            width: bbox.width,
            height: bbox.height,
        }
    }
}

/// Turn an optional detection into a concrete region.
///
/// Falls back to [`SubjectRegion::centered`] when there is no detection or
/// the box has no usable extent. Never fails.
///
/// # Examples
/// ```
/// # use headshot::detect::BoundingBox;
/// # use headshot::imaging::{SubjectRegion, resolve_subject_region};
/// let bbox = BoundingBox { x: 10.0, y: 20.0, width: 40.0, height: 60.0 };
/// let region = resolve_subject_region((200, 200), Some(bbox));
/// assert_eq!(region, SubjectRegion { x: 30.0, y: 50.0, width: 40.0, height: 60.0 });
/// ```
pub fn resolve_subject_region(image: (u32, u32), detection: Option<BoundingBox>) -> SubjectRegion {
    match detection {
        Some(bbox) if bbox.is_usable() => SubjectRegion::from_box(&bbox),
        _ => SubjectRegion::centered(image),
    }
}

/// Destination rectangle for drawing a whole source image onto a canvas.
///
/// May extend past the canvas on any side; the overflow is clipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scale and placement of the source image on the thumbnail canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropTransform {
    pub scale: f64,
    pub draw: DrawRect,
}

/// Compute the transform that centers `region` on a `target × target` canvas.
///
/// The scale uses the larger of the two per-axis ratios so the region's
/// shorter side fills the canvas, then multiplies by `zoom_margin`. The whole
/// image is scaled, and the offset moves the region's center onto the canvas
/// center.
pub fn calculate_crop_transform(
    image: (u32, u32),
    region: &SubjectRegion,
    target: u32,
    zoom_margin: f64,
) -> CropTransform {
    let t = target as f64;
    let scale = (t / region.width).max(t / region.height) * zoom_margin;

    let scaled_w = image.0 as f64 * scale;
    let scaled_h = image.1 as f64 * scale;

    let offset_x = (t - scaled_w) / 2.0 - (region.x * scale - scaled_w / 2.0);
    let offset_y = (t - scaled_h) / 2.0 - (region.y * scale - scaled_h / 2.0);

    CropTransform {
        scale,
        draw: DrawRect {
            x: offset_x,
            y: offset_y,
            width: scaled_w,
            height: scaled_h,
        },
    }
}

/// Fit `source` inside a `max × max` box, preserving aspect ratio.
///
/// Images already within the bound keep their size. The scaled side is
/// rounded to the nearest pixel and never drops below 1.
pub fn calculate_preview_dimensions(source: (u32, u32), max: u32) -> (u32, u32) {
    let (w, h) = source;

    if w > h {
        if w > max {
            let scaled = (h as f64 * max as f64 / w as f64).round() as u32;
            return (max, scaled.max(1));
        }
    } else if h > max {
        let scaled = (w as f64 * max as f64 / h as f64).round() as u32;
        return (scaled.max(1), max);
    }

    (w, h)
}

/// Centered zoom of a full-canvas draw.
///
/// The image is drawn at `canvas * scale` with equal margins on both sides,
/// which are negative when zooming in.
pub fn calculate_zoom_rect(canvas: (u32, u32), scale: f64) -> DrawRect {
    let (cw, ch) = (canvas.0 as f64, canvas.1 as f64);
    let width = cw * scale;
    let height = ch * scale;

    DrawRect {
        x: (cw - width) / 2.0,
        y: (ch - height) / 2.0,
        width,
        height,
    }
}
