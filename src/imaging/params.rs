//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what images to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`AdjustmentParameters`]: Interactive scale/brightness/contrast triple (all default 1.0).
//! - [`Threshold`]: Channel cutoff for background removal (default 200).
//! - [`CropParams`]: Full specification for a circular crop: computed transform + canvas size.
//! - [`RenderParams`]: Full specification for an adjusted render: canvas, placement, filters.
//! - [`Resampling`]: Speed/quality trade-off when the source has to shrink.

use super::calculations::{CropTransform, DrawRect};

/// Scale, brightness and contrast applied by the adjustment pipeline.
///
/// All three are positive multipliers; `1.0` leaves the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentParameters {
    pub scale: f64,
    pub brightness: f64,
    pub contrast: f64,
}

impl AdjustmentParameters {
    /// True when rendering with these parameters is a no-op.
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.brightness == 1.0 && self.contrast == 1.0
    }
}

impl Default for AdjustmentParameters {
    fn default() -> Self {
        Self {
            scale: 1.0,
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

/// Per-channel cutoff for background removal.
///
/// A pixel is background when R, G and B are all strictly above the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(pub u8);

impl Threshold {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(200)
    }
}

/// Parameters for a circular thumbnail render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropParams {
    /// Edge of the square output canvas.
    pub target_size: u32,
    pub transform: CropTransform,
}

/// Filter used when the source is drawn smaller than its native size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampling {
    /// Triangle filter, for interactive previews.
    Fast,
    /// Lanczos3, for anything that gets stored.
    #[default]
    Quality,
}

/// Parameters for an adjusted render onto a canvas of the given size.
///
/// `draw` is where the whole source lands on the canvas; brightness and
/// contrast from `adjustments` are applied to the drawn pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub draw: DrawRect,
    pub adjustments: AdjustmentParameters,
    pub resampling: Resampling,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustments_default_to_identity() {
        let p = AdjustmentParameters::default();
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.brightness, 1.0);
        assert_eq!(p.contrast, 1.0);
        assert!(p.is_identity());
    }

    #[test]
    fn any_change_is_not_identity() {
        let p = AdjustmentParameters {
            contrast: 1.1,
            ..AdjustmentParameters::default()
        };
        assert!(!p.is_identity());
    }

    #[test]
    fn resampling_defaults_to_quality() {
        assert_eq!(Resampling::default(), Resampling::Quality);
    }

    #[test]
    fn threshold_default_is_200() {
        assert_eq!(Threshold::default().value(), 200);
    }
}
