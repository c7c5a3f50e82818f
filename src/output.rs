//! CLI output formatting for every command.
//!
//! # Photo-First Display
//!
//! Every report leads with the photo it is about (file name and pixel size)
//! and lists what happened to it as indented context lines. Written files
//! follow `→`, the same way for every command.
//!
//! # Output Format
//!
//! ## Crop
//!
//! ```text
//! portrait.jpg (1200x800)
//!     Region: detected, center 610,340 size 220x260
//!     Thumbnail: 100x100 → portrait.avatar.png
//! ```
//!
//! ## Adjust
//!
//! ```text
//! portrait.jpg (1200x800)
//!     Region: center of image, center 600,400 size 600x400
//!     Adjustments: scale 1.20, brightness 1.10, contrast 0.90
//!     Working image: 1200x800 → portrait.adjusted.png
//!     Thumbnail: 100x100 → portrait.avatar.png
//! ```
//!
//! ## Remove background
//!
//! ```text
//! portrait.jpg (1200x800)
//!     Background: threshold 200, 35% transparent
//!     Thumbnail: 100x100 → portrait.avatar.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{
    AdjustmentParameters, ImageBackend, RasterImage, SubjectRegion, Threshold,
};
use crate::session::{ImageSession, RegionSource};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_size(image: &RasterImage) -> String {
    format!("{}x{}", image.width(), image.height())
}

/// Header line: photo name and its pixel size.
///
/// ```text
/// portrait.jpg (1200x800)
/// ```
fn photo_header(name: &str, image: &RasterImage) -> String {
    format!("{} ({})", name, format_size(image))
}

/// Region line: where the crop is centered and how it was found.
fn region_line(region: &SubjectRegion, source: RegionSource) -> String {
    let origin = match source {
        RegionSource::Detected => "detected",
        RegionSource::Fallback => "center of image",
    };
    format!(
        "{}Region: {}, center {},{} size {}x{}",
        indent(1),
        origin,
        region.x.round(),
        region.y.round(),
        region.width.round(),
        region.height.round()
    )
}

/// Adjustment values with two decimals.
pub fn format_adjustments(params: &AdjustmentParameters) -> String {
    format!(
        "scale {:.2}, brightness {:.2}, contrast {:.2}",
        params.scale, params.brightness, params.contrast
    )
}

/// A written image: label, size and destination.
fn written_line(label: &str, image: &RasterImage, path: &Path) -> String {
    format!(
        "{}{}: {} \u{2192} {}",
        indent(1),
        label,
        format_size(image),
        path.display()
    )
}

/// Share of fully transparent pixels, in whole percent.
fn transparent_percent(image: &RasterImage) -> u64 {
    let total = image.width() as u64 * image.height() as u64;
    let clear = image.pixels().pixels().filter(|p| p[3] == 0).count() as u64;
    (clear * 100 + total / 2) / total
}

/// Lines shared by every report: header and region.
fn session_lines<B: ImageBackend>(session: &ImageSession<B>) -> Vec<String> {
    let mut lines = Vec::new();
    if let (Some(image), Some(region), Some(source)) = (
        session.original(),
        session.region(),
        session.region_source(),
    ) {
        lines.push(photo_header(session.name().unwrap_or("photo"), image));
        lines.push(region_line(region, source));
    } else {
        lines.push("No photo".to_string());
    }
    lines
}

fn thumbnail_lines<B: ImageBackend>(session: &ImageSession<B>, output: &Path) -> Vec<String> {
    session
        .thumbnail()
        .map(|thumb| written_line("Thumbnail", thumb, output))
        .into_iter()
        .collect()
}

// ============================================================================
// crop
// ============================================================================

/// Format the result of uploading a photo and cropping its thumbnail.
pub fn format_crop_output<B: ImageBackend>(session: &ImageSession<B>, output: &Path) -> Vec<String> {
    let mut lines = session_lines(session);
    lines.extend(thumbnail_lines(session, output));
    lines
}

pub fn print_crop_output<B: ImageBackend>(session: &ImageSession<B>, output: &Path) {
    for line in format_crop_output(session, output) {
        println!("{}", line);
    }
}

// ============================================================================
// adjust
// ============================================================================

/// Format the result of a committed adjustment.
///
/// `working` is where the full-resolution adjusted image went, if anywhere.
pub fn format_adjust_output<B: ImageBackend>(
    session: &ImageSession<B>,
    working: Option<&Path>,
    output: &Path,
) -> Vec<String> {
    let mut lines = session_lines(session);
    lines.push(format!(
        "{}Adjustments: {}",
        indent(1),
        format_adjustments(session.adjustments())
    ));
    if let (Some(path), Some(image)) = (working, session.original()) {
        lines.push(written_line("Working image", image, path));
    }
    lines.extend(thumbnail_lines(session, output));
    lines
}

pub fn print_adjust_output<B: ImageBackend>(
    session: &ImageSession<B>,
    working: Option<&Path>,
    output: &Path,
) {
    for line in format_adjust_output(session, working, output) {
        println!("{}", line);
    }
}

// ============================================================================
// preview
// ============================================================================

/// Format a rendered (uncommitted) preview.
pub fn format_preview_output<B: ImageBackend>(
    session: &ImageSession<B>,
    params: &AdjustmentParameters,
    preview: &RasterImage,
    output: &Path,
) -> Vec<String> {
    let mut lines = session_lines(session);
    lines.push(format!(
        "{}Adjustments: {} (not committed)",
        indent(1),
        format_adjustments(params)
    ));
    lines.push(written_line("Preview", preview, output));
    lines
}

pub fn print_preview_output<B: ImageBackend>(
    session: &ImageSession<B>,
    params: &AdjustmentParameters,
    preview: &RasterImage,
    output: &Path,
) {
    for line in format_preview_output(session, params, preview, output) {
        println!("{}", line);
    }
}

// ============================================================================
// remove-bg
// ============================================================================

/// Format the result of background removal.
pub fn format_background_output<B: ImageBackend>(
    session: &ImageSession<B>,
    threshold: Threshold,
    output: &Path,
) -> Vec<String> {
    let mut lines = session_lines(session);
    if let Some(image) = session.original() {
        lines.push(format!(
            "{}Background: threshold {}, {}% transparent",
            indent(1),
            threshold.value(),
            transparent_percent(image)
        ));
    }
    lines.extend(thumbnail_lines(session, output));
    lines
}

pub fn print_background_output<B: ImageBackend>(
    session: &ImageSession<B>,
    threshold: Threshold,
    output: &Path,
) {
    for line in format_background_output(session, threshold, output) {
        println!("{}", line);
    }
}
