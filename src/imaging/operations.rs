//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend, RasterImage};
use super::calculations::{
    SubjectRegion, calculate_crop_transform, calculate_preview_dimensions, calculate_zoom_rect,
};
use super::params::{AdjustmentParameters, CropParams, RenderParams, Resampling, Threshold};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    /// Edge of the square thumbnail in pixels.
    pub target_size: u32,
    /// Extra zoom on top of fitting the region's shorter side.
    pub zoom_margin: f64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            target_size: 100,
            zoom_margin: 1.2,
        }
    }
}

/// Plan a circular crop without executing it.
pub fn plan_thumbnail(
    image: (u32, u32),
    region: &SubjectRegion,
    config: &ThumbnailConfig,
) -> CropParams {
    CropParams {
        target_size: config.target_size,
        transform: calculate_crop_transform(image, region, config.target_size, config.zoom_margin),
    }
}

/// Render the circular thumbnail for `region`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    image: &RasterImage,
    region: &SubjectRegion,
    config: &ThumbnailConfig,
) -> Result<RasterImage> {
    let params = plan_thumbnail(image.dimensions(), region, config);
    debug!(
        scale = params.transform.scale,
        offset_x = params.transform.draw.x,
        offset_y = params.transform.draw.y,
        "circular crop"
    );
    backend.circular_crop(image, &params)
}

/// Plan an interactive preview: the image fitted into `max × max`, zoomed
/// about the canvas center.
pub fn plan_preview(
    image: (u32, u32),
    adjustments: &AdjustmentParameters,
    max: u32,
) -> RenderParams {
    let canvas = calculate_preview_dimensions(image, max);
    RenderParams {
        canvas_width: canvas.0,
        canvas_height: canvas.1,
        draw: calculate_zoom_rect(canvas, adjustments.scale),
        adjustments: *adjustments,
        resampling: Resampling::Fast,
    }
}

/// Plan a full-resolution render with the same zoom and filters.
pub fn plan_commit(image: (u32, u32), adjustments: &AdjustmentParameters) -> RenderParams {
    RenderParams {
        canvas_width: image.0,
        canvas_height: image.1,
        draw: calculate_zoom_rect(image, adjustments.scale),
        adjustments: *adjustments,
        resampling: Resampling::Quality,
    }
}

/// Render a bounded preview of `image` with `adjustments`.
pub fn render_preview(
    backend: &impl ImageBackend,
    image: &RasterImage,
    adjustments: &AdjustmentParameters,
    max: u32,
) -> Result<RasterImage> {
    backend.render(image, &plan_preview(image.dimensions(), adjustments, max))
}

/// Re-render `image` at its native size with `adjustments` baked in.
pub fn render_commit(
    backend: &impl ImageBackend,
    image: &RasterImage,
    adjustments: &AdjustmentParameters,
) -> Result<RasterImage> {
    backend.render(image, &plan_commit(image.dimensions(), adjustments))
}

/// Make near-white pixels transparent.
pub fn remove_background(
    backend: &impl ImageBackend,
    image: &RasterImage,
    threshold: Threshold,
) -> Result<RasterImage> {
    backend.remove_background(image, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::solid_image;

    #[test]
    fn plan_thumbnail_uses_config() {
        let region = SubjectRegion::centered((200, 200));
        let params = plan_thumbnail((200, 200), &region, &ThumbnailConfig::default());

        assert_eq!(params.target_size, 100);
        assert!((params.transform.scale - 1.2).abs() < 1e-9);
        assert!((params.transform.draw.x + 70.0).abs() < 1e-9);
    }

    #[test]
    fn plan_thumbnail_custom_size() {
        let config = ThumbnailConfig {
            target_size: 256,
            zoom_margin: 1.0,
        };
        let region = SubjectRegion::centered((512, 512));
        let params = plan_thumbnail((512, 512), &region, &config);

        assert_eq!(params.target_size, 256);
        assert!((params.transform.scale - 1.0).abs() < 1e-9);
    }

    #[test]
    fn create_thumbnail_uses_backend() {
        let backend = MockBackend::new();
        let image = solid_image(640, 480, [0, 0, 0, 255]);
        let region = SubjectRegion::centered((640, 480));

        let thumb = create_thumbnail(&backend, &image, &region, &ThumbnailConfig::default())
            .unwrap();
        assert_eq!(thumb.dimensions(), (100, 100));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::CircularCrop {
                source: (640, 480),
                target_size: 100,
                ..
            }
        ));
    }

    #[test]
    fn plan_preview_bounds_canvas() {
        let adjustments = AdjustmentParameters {
            scale: 1.5,
            ..AdjustmentParameters::default()
        };
        let params = plan_preview((2000, 1000), &adjustments, 400);

        assert_eq!((params.canvas_width, params.canvas_height), (400, 200));
        assert_eq!(params.draw.width, 600.0);
        assert_eq!(params.draw.x, -100.0);
        assert_eq!(params.resampling, Resampling::Fast);
    }

    #[test]
    fn plan_commit_uses_native_size() {
        let adjustments = AdjustmentParameters {
            scale: 0.8,
            brightness: 1.1,
            contrast: 0.9,
        };
        let params = plan_commit((3000, 2000), &adjustments);

        assert_eq!((params.canvas_width, params.canvas_height), (3000, 2000));
        assert_eq!(params.draw.width, 2400.0);
        assert_eq!(params.draw.x, 300.0);
        assert_eq!(params.adjustments, adjustments);
        assert_eq!(params.resampling, Resampling::Quality);
    }

    #[test]
    fn render_preview_and_commit_call_backend() {
        let backend = MockBackend::new();
        let image = solid_image(1200, 900, [0, 0, 0, 255]);
        let adjustments = AdjustmentParameters::default();

        let preview = render_preview(&backend, &image, &adjustments, 400).unwrap();
        let committed = render_commit(&backend, &image, &adjustments).unwrap();

        assert_eq!(preview.dimensions(), (400, 300));
        assert_eq!(committed.dimensions(), (1200, 900));
        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Render { canvas: (400, 300), .. }));
        assert!(matches!(&ops[1], RecordedOp::Render { canvas: (1200, 900), .. }));
    }

    #[test]
    fn remove_background_passes_threshold() {
        let backend = MockBackend::new();
        let image = solid_image(10, 10, [255, 255, 255, 255]);
        remove_background(&backend, &image, Threshold(180)).unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::RemoveBackground {
                source: (10, 10),
                threshold: 180,
            }]
        );
    }
}
