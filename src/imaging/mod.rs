//! Image processing for profile photos.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` → RGBA8 |
//! | **Circular crop** | scale about the subject region + circular alpha mask |
//! | **Adjust** | centered zoom, brightness then contrast |
//! | **Background removal** | per-pixel near-white → transparent |
//! | **Encode** | PNG (keeps alpha) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for region and transform math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, RasterImage};
pub use calculations::{
    CropTransform, DrawRect, SubjectRegion, calculate_crop_transform,
    calculate_preview_dimensions, calculate_zoom_rect, resolve_subject_region,
};
pub use operations::{
    ThumbnailConfig, create_thumbnail, remove_background, render_commit, render_preview,
};
pub use params::{AdjustmentParameters, CropParams, RenderParams, Resampling, Threshold};
pub use rust_backend::RustBackend;
