//! # Headshot
//!
//! Face-aware circular profile photos for a resume builder. A user uploads
//! a portrait, the crate finds the subject, renders a small circular
//! thumbnail centered on it, and lets the user zoom, brighten, add contrast
//! or drop a white background before the photo lands in the exported
//! document.
//!
//! # Architecture: One Session, Pure Operations Underneath
//!
//! ```text
//! Upload ─▶ validate ─▶ decode ─▶ detect ─▶ region ─▶ circular crop ─▶ thumbnail
//!                                                          ▲
//!            adjust (preview ... commit) ─────────────────┤
//!            remove background ───────────────────────────┘
//! ```
//!
//! [`session::ImageSession`] owns the state: working image, subject region,
//! thumbnail and committed adjustments. Every pixel operation below it is a
//! pure function of its inputs, planned by [`imaging`]'s calculation layer
//! and executed by an [`imaging::ImageBackend`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`upload`] | MIME type and size checks before anything is decoded |
//! | [`detect`] | Face detector capability: injected detector or nothing |
//! | [`imaging`] | Region math, circular crop, adjustments, background removal |
//! | [`session`] | Photo state, adjustment pipeline, atomic updates |
//! | [`export`] | Thumbnail or placeholder avatar for the document renderer |
//! | [`config`] | `headshot.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Detection Is Optional
//!
//! A detector is injected once when the session is created. Without one, or
//! when it finds nothing, the crop centers on the middle of the image with a
//! region half the image's size. Detector errors are logged and treated as
//! "no face": a photo is never rejected because detection failed.
//!
//! ## All-or-Nothing Updates
//!
//! Image, region and thumbnail are computed into locals and stored together,
//! so the thumbnail always matches the image it was cut from, and a failed
//! step leaves the previous photo untouched.
//!
//! ## Commits Compound
//!
//! Committing an adjustment re-renders the working image at full resolution
//! and replaces it. The next adjustment starts from that result, so zoom and
//! filters accumulate across commits instead of being reapplied to the
//! original upload.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and PNG encoding use the `image` crate; per-pixel
//! filters run row-parallel on `rayon`. No system libraries are needed.

pub mod config;
pub mod detect;
pub mod export;
pub mod imaging;
pub mod output;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
