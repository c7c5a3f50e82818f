//! Configuration module.
//!
//! Handles loading and validating `headshot.toml`. Every key is optional:
//! user values are merged on top of the stock defaults, unknown keys are
//! rejected to catch typos early, and the result is validated before use.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [crop]
//! target_size = 100   # Thumbnail edge in pixels
//! zoom_margin = 1.2   # Extra zoom around the subject region
//!
//! [adjust]
//! preview_max = 400   # Longest edge of the adjustment preview
//!
//! [upload]
//! max_bytes = 2097152 # Largest accepted upload (2 MiB)
//!
//! [background]
//! threshold = 200     # Channels above this on all of R, G, B are background
//! ```

use crate::imaging::{Threshold, ThumbnailConfig};
use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `headshot.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Circular thumbnail geometry.
    pub crop: CropConfig,
    /// Adjustment preview settings.
    pub adjust: AdjustConfig,
    /// Upload limits.
    pub upload: UploadConfig,
    /// Background removal settings.
    pub background: BackgroundConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crop.target_size == 0 {
            return Err(ConfigError::Validation(
                "crop.target_size must be greater than 0".into(),
            ));
        }
        if !(self.crop.zoom_margin.is_finite() && self.crop.zoom_margin > 0.0) {
            return Err(ConfigError::Validation(
                "crop.zoom_margin must be a positive number".into(),
            ));
        }
        if self.adjust.preview_max == 0 {
            return Err(ConfigError::Validation(
                "adjust.preview_max must be greater than 0".into(),
            ));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "upload.max_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn thumbnail(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            target_size: self.crop.target_size,
            zoom_margin: self.crop.zoom_margin,
        }
    }

    pub fn threshold(&self) -> Threshold {
        Threshold(self.background.threshold)
    }
}

/// Circular thumbnail geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Edge of the square thumbnail in pixels.
    pub target_size: u32,
    /// Multiplier applied after fitting the subject region's shorter side.
    pub zoom_margin: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        let defaults = ThumbnailConfig::default();
        Self {
            target_size: defaults.target_size,
            zoom_margin: defaults.zoom_margin,
        }
    }
}

/// Adjustment preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdjustConfig {
    /// Longest edge of the preview canvas.
    pub preview_max: u32,
}

impl Default for AdjustConfig {
    fn default() -> Self {
        Self { preview_max: 400 }
    }
}

/// Upload limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Largest accepted upload in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Background removal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// A pixel is background when R, G and B all exceed this value.
    pub threshold: u8,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default().value(),
        }
    }
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `headshot.toml` file.
///
/// `None` means "no config file": stock defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(Config::default()),
    }
}

/// Returns a fully-commented stock `headshot.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Headshot Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Circular thumbnail
# ---------------------------------------------------------------------------
[crop]
# Edge of the square thumbnail in pixels. Everything outside the inscribed
# circle is transparent.
target_size = 100

# The subject region's shorter side is fitted to the thumbnail, then zoomed
# out by this factor so the face is not cropped too tightly.
zoom_margin = 1.2

# ---------------------------------------------------------------------------
# Adjustment preview
# ---------------------------------------------------------------------------
[adjust]
# Longest edge of the interactive preview. Commits always render at the
# photo's own resolution.
preview_max = 400

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[upload]
# Largest accepted upload in bytes (2 MiB).
max_bytes = 2097152

# ---------------------------------------------------------------------------
# Background removal
# ---------------------------------------------------------------------------
[background]
# Pixels whose red, green and blue are all above this value (0-255) become
# transparent.
threshold = 200
"##
}
