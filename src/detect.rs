//! Face detection capability.
//!
//! The detector model itself is not part of this crate. Anything that can
//! look at a decoded image and report zero or one face box implements
//! [`FaceDetector`]. A session is built with a [`DetectorCapability`], chosen
//! once up front:
//!
//! - [`DetectorCapability::Available`] wraps a detector.
//! - [`DetectorCapability::Unavailable`] means no model was loaded.
//!
//! Callers never see detector failures. [`DetectorCapability::detect`]
//! collapses "unavailable", "nothing found" and "detector errored" into
//! `None`, and the region resolver turns `None` into the centered fallback.
//!
//! ## Built-in detectors
//!
//! - [`FixedDetector`]: reports a box the caller already knows (CLI `--face`).
//! - [`SidecarDetector`]: reads the box from a JSON file next to the photo.
//!   `portrait.jpg` pairs with `portrait.face.json`:
//!
//! ```json
//! { "x": 120, "y": 80, "width": 160, "height": 190 }
//! ```
//!
//! A sidecar containing `null` records that the photo has no face.

use crate::imaging::RasterImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed face sidecar: {0}")]
    Sidecar(#[from] serde_json::Error),
    #[error("Detection failed: {0}")]
    Failed(String),
}

/// Face box as reported by a detector: top-left corner plus size, in
/// source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// A box can center a crop only if it has finite, positive extent.
    pub fn is_usable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Parses `x,y,width,height`.
impl FromStr for BoundingBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid face box '{s}': {e}"))?;

        match parts.as_slice() {
            &[x, y, width, height] => {
                let bbox = BoundingBox {
                    x,
                    y,
                    width,
                    height,
                };
                if bbox.is_usable() {
                    Ok(bbox)
                } else {
                    Err(format!("face box '{s}' must have positive width and height"))
                }
            }
            _ => Err(format!(
                "face box '{s}' must have four values: x,y,width,height"
            )),
        }
    }
}

/// Something that can find a single face in an image.
pub trait FaceDetector: Send + Sync {
    /// Return the most prominent face, `Ok(None)` when there is none.
    fn detect(&self, image: &RasterImage) -> Result<Option<BoundingBox>, DetectError>;
}

/// Detector selected at session start.
pub enum DetectorCapability {
    Available(Box<dyn FaceDetector>),
    Unavailable,
}

impl DetectorCapability {
    pub fn available(detector: impl FaceDetector + 'static) -> Self {
        Self::Available(Box::new(detector))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Run detection, folding every failure into `None`.
    pub fn detect(&self, image: &RasterImage) -> Option<BoundingBox> {
        match self {
            Self::Unavailable => {
                debug!("face detector unavailable, using centered region");
                None
            }
            Self::Available(detector) => match detector.detect(image) {
                Ok(Some(bbox)) => {
                    debug!(%bbox, "face detected");
                    Some(bbox)
                }
                Ok(None) => {
                    debug!("no face detected, using centered region");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "face detection failed, using centered region");
                    None
                }
            },
        }
    }
}

impl fmt::Debug for DetectorCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("DetectorCapability::Available"),
            Self::Unavailable => f.write_str("DetectorCapability::Unavailable"),
        }
    }
}

/// Reports the same box for every image.
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub BoundingBox);

impl FaceDetector for FixedDetector {
    fn detect(&self, _image: &RasterImage) -> Result<Option<BoundingBox>, DetectError> {
        Ok(Some(self.0))
    }
}

/// Reads the face box from a `.face.json` sidecar.
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    path: PathBuf,
}

impl SidecarDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sidecar path for a photo: `dir/portrait.jpg` → `dir/portrait.face.json`.
    pub fn sidecar_path(photo: &Path) -> PathBuf {
        photo.with_extension("face.json")
    }

    /// Detector for `photo` if its sidecar exists.
    pub fn locate(photo: &Path) -> Option<Self> {
        let path = Self::sidecar_path(photo);
        path.is_file().then(|| Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FaceDetector for SidecarDetector {
    fn detect(&self, _image: &RasterImage) -> Result<Option<BoundingBox>, DetectError> {
        let content = std::fs::read_to_string(&self.path)?;
        let bbox: Option<BoundingBox> = serde_json::from_str(&content)?;
        Ok(bbox)
    }
}
