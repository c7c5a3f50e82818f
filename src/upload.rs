//! Upload validation.
//!
//! Checks run on the raw file before any decoding: the declared MIME type
//! must be an `image/*` type and the payload must fit the size limit
//! (2 MiB unless configured otherwise). A rejected upload never reaches the
//! decoder and never touches session state.

use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

/// 2 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Reasons an upload is refused before decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("{name} is not an image file (type: {mime_type})")]
    NotAnImage { name: String, mime_type: String },
    #[error("{name} is too large ({size} bytes, limit is {limit} bytes)")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },
}

/// An uploaded file as received from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, taking the MIME type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, guess_mime_type(path), bytes))
    }

    /// Check type and size. MIME type wins over size when both are wrong.
    pub fn validate(&self, max_bytes: usize) -> Result<(), InvalidInput> {
        if !self.mime_type.starts_with("image/") {
            return Err(InvalidInput::NotAnImage {
                name: self.name.clone(),
                mime_type: self.mime_type.clone(),
            });
        }
        if self.bytes.len() > max_bytes {
            return Err(InvalidInput::TooLarge {
                name: self.name.clone(),
                size: self.bytes.len(),
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

/// MIME type for a path based on its extension.
///
/// Unknown extensions map to `application/octet-stream`, which fails
/// validation.
pub fn guess_mime_type(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}
