//! Editing session for one profile photo.
//!
//! An [`ImageSession`] owns everything the resume preview and export read:
//! the working image, the subject region it was cropped around, the
//! circular thumbnail, and the last committed adjustment parameters.
//!
//! ## Lifecycle
//!
//! ```text
//!            upload ok                     commit / remove_background
//!   empty ─────────────▶ populated ──────────────────────────────▶ populated
//!     ▲                      │
//!     └──────── remove ──────┘
//! ```
//!
//! ## Atomicity
//!
//! Image, region and thumbnail live in one [`Option`] and are replaced
//! together. Every operation computes the complete new state first and only
//! then stores it, so a failed decode, render or crop leaves the session
//! exactly as it was, and the thumbnail always matches the stored image.
//!
//! ## Adjustments
//!
//! [`ImageSession::adjust`] hands out an [`AdjustmentPipeline`] that borrows
//! the session mutably for the whole interactive phase. Previews never touch
//! session state; dropping the pipeline without calling
//! [`commit`](AdjustmentPipeline::commit) cancels. A commit bakes the
//! parameters into the working image, so a later commit applies on top of
//! the already adjusted image rather than on the original upload.

use crate::config::Config;
use crate::detect::DetectorCapability;
use crate::export::ExportAvatar;
use crate::imaging::{
    AdjustmentParameters, BackendError, ImageBackend, RasterImage, RustBackend, SubjectRegion,
    Threshold, create_thumbnail, remove_background, render_commit, render_preview,
    resolve_subject_region,
};
use crate::upload::{InvalidInput, Upload};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("Failed to load the image: {0}")]
    DecodeFailure(String),
    #[error("No photo uploaded")]
    NoImage,
    #[error("Invalid adjustment: {0}")]
    InvalidAdjustment(String),
    #[error("Image processing failed: {0}")]
    Processing(#[from] BackendError),
}

/// Where the current subject region came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    Detected,
    Fallback,
}

#[derive(Debug, Clone)]
struct SessionImage {
    name: String,
    original: RasterImage,
    region: SubjectRegion,
    region_source: RegionSource,
    thumbnail: RasterImage,
}

/// State of one photo editing session.
pub struct ImageSession<B: ImageBackend = RustBackend> {
    backend: B,
    detector: DetectorCapability,
    config: Config,
    image: Option<SessionImage>,
    adjustments: AdjustmentParameters,
}

impl ImageSession<RustBackend> {
    /// Session on the production backend.
    pub fn with_detector(detector: DetectorCapability, config: Config) -> Self {
        Self::new(RustBackend::new(), detector, config)
    }
}

impl<B: ImageBackend> ImageSession<B> {
    pub fn new(backend: B, detector: DetectorCapability, config: Config) -> Self {
        Self {
            backend,
            detector,
            config,
            image: None,
            adjustments: AdjustmentParameters::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// File name of the current photo.
    pub fn name(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.name.as_str())
    }

    /// Working image: the upload with every committed edit applied.
    pub fn original(&self) -> Option<&RasterImage> {
        self.image.as_ref().map(|i| &i.original)
    }

    pub fn region(&self) -> Option<&SubjectRegion> {
        self.image.as_ref().map(|i| &i.region)
    }

    pub fn region_source(&self) -> Option<RegionSource> {
        self.image.as_ref().map(|i| i.region_source)
    }

    pub fn thumbnail(&self) -> Option<&RasterImage> {
        self.image.as_ref().map(|i| &i.thumbnail)
    }

    /// Parameters of the last commit (defaults after upload or remove).
    pub fn adjustments(&self) -> &AdjustmentParameters {
        &self.adjustments
    }

    /// What the document renderer should draw for the profile photo.
    pub fn export_avatar(&self) -> ExportAvatar<'_> {
        match self.thumbnail() {
            Some(thumbnail) => ExportAvatar::Thumbnail(thumbnail),
            None => ExportAvatar::Placeholder,
        }
    }

    /// Validate, decode, locate the subject and render the thumbnail.
    ///
    /// Replaces any previous photo only when every step succeeds.
    pub fn upload(&mut self, upload: &Upload) -> Result<&RasterImage, SessionError> {
        upload.validate(self.config.upload.max_bytes)?;

        let original = self
            .backend
            .decode(&upload.bytes)
            .map_err(|e| SessionError::DecodeFailure(e.to_string()))?;

        let detection = self.detector.detect(&original);
        let region_source = match detection {
            Some(bbox) if bbox.is_usable() => RegionSource::Detected,
            _ => RegionSource::Fallback,
        };
        let region = resolve_subject_region(original.dimensions(), detection);

        let thumbnail =
            create_thumbnail(&self.backend, &original, &region, &self.config.thumbnail())?;

        info!(
            name = %upload.name,
            width = original.width(),
            height = original.height(),
            ?region_source,
            "photo uploaded"
        );

        self.adjustments = AdjustmentParameters::default();
        let stored = self.image.insert(SessionImage {
            name: upload.name.clone(),
            original,
            region,
            region_source,
            thumbnail,
        });
        Ok(&stored.thumbnail)
    }

    /// Start an interactive adjustment from the last committed parameters.
    pub fn adjust(&mut self) -> Result<AdjustmentPipeline<'_, B>, SessionError> {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        let params = self.adjustments;
        Ok(AdjustmentPipeline {
            session: self,
            params,
        })
    }

    /// Make near-white pixels transparent and refresh the thumbnail.
    ///
    /// `None` uses the configured threshold.
    pub fn remove_background(
        &mut self,
        threshold: Option<Threshold>,
    ) -> Result<&RasterImage, SessionError> {
        let threshold = threshold.unwrap_or_else(|| self.config.threshold());
        let current = self.image.as_ref().ok_or(SessionError::NoImage)?;

        let cleaned = remove_background(&self.backend, &current.original, threshold)?;
        let thumbnail = create_thumbnail(
            &self.backend,
            &cleaned,
            &current.region,
            &self.config.thumbnail(),
        )?;

        info!(threshold = threshold.value(), "background removed");
        self.replace_image(cleaned, thumbnail)
    }

    /// Forget the photo and reset adjustments.
    pub fn remove(&mut self) {
        if let Some(image) = self.image.take() {
            info!(name = %image.name, "photo removed");
        }
        self.adjustments = AdjustmentParameters::default();
    }

    fn apply_adjustments(
        &mut self,
        params: AdjustmentParameters,
    ) -> Result<&RasterImage, SessionError> {
        if params.is_identity() {
            debug!("identity adjustments, nothing to render");
            let thumbnail = self
                .image
                .as_ref()
                .map(|i| &i.thumbnail)
                .ok_or(SessionError::NoImage)?;
            self.adjustments = params;
            return Ok(thumbnail);
        }

        let current = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let adjusted = render_commit(&self.backend, &current.original, &params)?;
        let thumbnail = create_thumbnail(
            &self.backend,
            &adjusted,
            &current.region,
            &self.config.thumbnail(),
        )?;

        info!(
            scale = params.scale,
            brightness = params.brightness,
            contrast = params.contrast,
            "adjustments committed"
        );
        self.adjustments = params;
        self.replace_image(adjusted, thumbnail)
    }

    /// Swap in a new working image and its thumbnail, keeping the region.
    fn replace_image(
        &mut self,
        original: RasterImage,
        thumbnail: RasterImage,
    ) -> Result<&RasterImage, SessionError> {
        let current = self.image.as_mut().ok_or(SessionError::NoImage)?;
        current.original = original;
        current.thumbnail = thumbnail;
        Ok(&current.thumbnail)
    }
}

/// Interactive scale/brightness/contrast editing over a session.
///
/// Holds the session exclusively until it is committed or dropped.
pub struct AdjustmentPipeline<'s, B: ImageBackend> {
    session: &'s mut ImageSession<B>,
    params: AdjustmentParameters,
}

fn check_positive(name: &str, value: f64) -> Result<f64, SessionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SessionError::InvalidAdjustment(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

impl<'s, B: ImageBackend> AdjustmentPipeline<'s, B> {
    pub fn parameters(&self) -> &AdjustmentParameters {
        &self.params
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), SessionError> {
        self.params.scale = check_positive("scale", scale)?;
        Ok(())
    }

    pub fn set_brightness(&mut self, brightness: f64) -> Result<(), SessionError> {
        self.params.brightness = check_positive("brightness", brightness)?;
        Ok(())
    }

    pub fn set_contrast(&mut self, contrast: f64) -> Result<(), SessionError> {
        self.params.contrast = check_positive("contrast", contrast)?;
        Ok(())
    }

    /// Set all three at once; nothing changes if any value is invalid.
    pub fn set_parameters(&mut self, params: AdjustmentParameters) -> Result<(), SessionError> {
        check_positive("scale", params.scale)?;
        check_positive("brightness", params.brightness)?;
        check_positive("contrast", params.contrast)?;
        self.params = params;
        Ok(())
    }

    /// Render the bounded preview for the current parameters.
    pub fn preview(&self) -> Result<RasterImage, SessionError> {
        let image = self.session.image.as_ref().ok_or(SessionError::NoImage)?;
        debug!(
            scale = self.params.scale,
            brightness = self.params.brightness,
            contrast = self.params.contrast,
            "adjustment preview"
        );
        let preview = render_preview(
            &self.session.backend,
            &image.original,
            &self.params,
            self.session.config.adjust.preview_max,
        )?;
        Ok(preview)
    }

    /// Bake the parameters into the working image and re-crop the thumbnail.
    pub fn commit(self) -> Result<&'s RasterImage, SessionError> {
        let AdjustmentPipeline { session, params } = self;
        session.apply_adjustments(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, FixedDetector};
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{png_upload, solid_image};

    fn mock_session(images: Vec<RasterImage>) -> ImageSession<MockBackend> {
        let backend = MockBackend::with_decoded(images.into_iter().map(Ok).collect());
        ImageSession::new(backend, DetectorCapability::Unavailable, Config::default())
    }

    fn upload() -> Upload {
        Upload::new("me.png", "image/png", vec![0; 64])
    }

    #[test]
    fn new_session_is_empty() {
        let session = mock_session(vec![]);
        assert!(!session.has_image());
        assert!(session.thumbnail().is_none());
        assert!(session.region().is_none());
        assert_eq!(*session.adjustments(), AdjustmentParameters::default());
        assert!(session.export_avatar().is_placeholder());
    }

    #[test]
    fn upload_populates_everything() {
        let mut session = mock_session(vec![solid_image(200, 200, [0, 0, 0, 255])]);
        let thumb = session.upload(&upload()).unwrap();
        assert_eq!(thumb.dimensions(), (100, 100));

        assert_eq!(session.name(), Some("me.png"));
        assert_eq!(session.original().unwrap().dimensions(), (200, 200));
        assert_eq!(
            session.region(),
            Some(&SubjectRegion {
                x: 100.0,
                y: 100.0,
                width: 100.0,
                height: 100.0,
            })
        );
        assert_eq!(session.region_source(), Some(RegionSource::Fallback));
        assert!(!session.export_avatar().is_placeholder());
    }

    #[test]
    fn upload_uses_detector_box() {
        let backend = MockBackend::with_decoded(vec![Ok(solid_image(300, 300, [0, 0, 0, 255]))]);
        let detector = DetectorCapability::available(FixedDetector(BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 40.0,
            height: 60.0,
        }));
        let mut session = ImageSession::new(backend, detector, Config::default());
        session.upload(&upload()).unwrap();

        assert_eq!(session.region_source(), Some(RegionSource::Detected));
        let region = session.region().unwrap();
        assert_eq!((region.x, region.y), (30.0, 50.0));
        assert_eq!((region.width, region.height), (40.0, 60.0));
    }

    #[test]
    fn invalid_upload_is_rejected_before_decode() {
        let mut session = mock_session(vec![solid_image(10, 10, [0, 0, 0, 255])]);
        let result = session.upload(&Upload::new("cv.pdf", "application/pdf", vec![1]));

        assert!(matches!(
            result,
            Err(SessionError::InvalidInput(InvalidInput::NotAnImage { .. }))
        ));
        assert!(session.backend().get_operations().is_empty());
        assert!(!session.has_image());
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let mut session = mock_session(vec![]);
        let big = Upload::new("big.png", "image/png", vec![0; 2 * 1024 * 1024 + 1]);
        assert!(matches!(
            session.upload(&big),
            Err(SessionError::InvalidInput(InvalidInput::TooLarge { .. }))
        ));
    }

    #[test]
    fn decode_failure_keeps_previous_photo() {
        let mut session = mock_session(vec![solid_image(50, 50, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();
        let before = session.thumbnail().cloned();

        // No more mock images: next decode fails
        let result = session.upload(&upload());
        assert!(matches!(result, Err(SessionError::DecodeFailure(_))));
        assert_eq!(session.thumbnail().cloned(), before);
        assert_eq!(session.original().unwrap().dimensions(), (50, 50));
    }

    #[test]
    fn degenerate_image_is_a_decode_failure() {
        let backend = MockBackend::with_decoded(vec![Err(BackendError::Degenerate {
            width: 0,
            height: 0,
        })]);
        let mut session =
            ImageSession::new(backend, DetectorCapability::Unavailable, Config::default());
        assert!(matches!(
            session.upload(&upload()),
            Err(SessionError::DecodeFailure(_))
        ));
        assert!(!session.has_image());
    }

    #[test]
    fn crop_failure_leaves_session_empty() {
        let backend = MockBackend {
            fail_crop: true,
            ..MockBackend::with_decoded(vec![Ok(solid_image(20, 20, [0, 0, 0, 255]))])
        };
        let mut session =
            ImageSession::new(backend, DetectorCapability::Unavailable, Config::default());
        assert!(matches!(
            session.upload(&upload()),
            Err(SessionError::Processing(_))
        ));
        assert!(!session.has_image());
    }

    #[test]
    fn adjust_without_photo_errors() {
        let mut session = mock_session(vec![]);
        assert!(matches!(session.adjust(), Err(SessionError::NoImage)));
    }

    #[test]
    fn preview_does_not_mutate_session() {
        let mut session = mock_session(vec![solid_image(1600, 1200, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();
        let thumb_before = session.thumbnail().cloned();

        {
            let mut pipeline = session.adjust().unwrap();
            pipeline.set_scale(1.5).unwrap();
            pipeline.set_brightness(1.2).unwrap();
            let preview = pipeline.preview().unwrap();
            assert_eq!(preview.dimensions(), (400, 300));
            // dropped without commit
        }

        assert_eq!(session.thumbnail().cloned(), thumb_before);
        assert_eq!(session.original().unwrap().dimensions(), (1600, 1200));
        assert_eq!(*session.adjustments(), AdjustmentParameters::default());
    }

    #[test]
    fn commit_renders_native_then_recrops_with_same_region() {
        let mut session = mock_session(vec![solid_image(800, 600, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();
        let region_before = *session.region().unwrap();

        let mut pipeline = session.adjust().unwrap();
        pipeline.set_contrast(1.3).unwrap();
        pipeline.commit().unwrap();

        let ops = session.backend().get_operations();
        // decode, crop, render (commit), crop
        assert_eq!(ops.len(), 4);
        assert!(matches!(
            &ops[2],
            RecordedOp::Render {
                canvas: (800, 600),
                contrast,
                ..
            } if *contrast == 1.3
        ));
        assert!(matches!(
            &ops[3],
            RecordedOp::CircularCrop {
                source: (800, 600),
                ..
            }
        ));
        assert_eq!(*session.region().unwrap(), region_before);
        assert_eq!(session.adjustments().contrast, 1.3);
        // Mock crop output carries its sequence number: the stored
        // thumbnail is the one produced after the commit.
        assert_eq!(session.thumbnail().unwrap().pixels().get_pixel(0, 0)[0], 4);
    }

    #[test]
    fn identity_commit_skips_rendering() {
        let mut session = mock_session(vec![solid_image(50, 50, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();

        let before = session.thumbnail().cloned();
        let returned = session.adjust().unwrap().commit().unwrap().clone();
        assert_eq!(Some(returned), before);
        // decode + initial crop only
        assert_eq!(session.backend().get_operations().len(), 2);

        // A real commit afterwards still renders and re-crops
        let mut pipeline = session.adjust().unwrap();
        pipeline.set_scale(1.5).unwrap();
        pipeline.commit().unwrap();
        assert_eq!(session.backend().get_operations().len(), 4);
        assert_eq!(session.adjustments().scale, 1.5);
    }

    #[test]
    fn next_pipeline_starts_from_committed_parameters() {
        let mut session = mock_session(vec![solid_image(100, 100, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();

        let mut pipeline = session.adjust().unwrap();
        pipeline.set_brightness(1.4).unwrap();
        pipeline.commit().unwrap();

        let pipeline = session.adjust().unwrap();
        assert_eq!(pipeline.parameters().brightness, 1.4);
    }

    #[test]
    fn invalid_adjustments_rejected() {
        let mut session = mock_session(vec![solid_image(10, 10, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();
        let mut pipeline = session.adjust().unwrap();

        assert!(matches!(
            pipeline.set_scale(0.0),
            Err(SessionError::InvalidAdjustment(_))
        ));
        assert!(pipeline.set_brightness(-1.0).is_err());
        assert!(pipeline.set_contrast(f64::NAN).is_err());
        assert!(
            pipeline
                .set_parameters(AdjustmentParameters {
                    scale: 2.0,
                    brightness: f64::INFINITY,
                    contrast: 1.0,
                })
                .is_err()
        );
        assert_eq!(*pipeline.parameters(), AdjustmentParameters::default());
    }

    #[test]
    fn failed_commit_keeps_previous_state() {
        let mut session = ImageSession::new(
            MockBackend::with_decoded(vec![Ok(solid_image(40, 40, [0, 0, 0, 255]))]),
            DetectorCapability::Unavailable,
            Config::default(),
        );
        session.upload(&upload()).unwrap();
        let before = session.thumbnail().cloned();

        session.backend = MockBackend::failing_crop();
        let mut pipeline = session.adjust().unwrap();
        pipeline.set_scale(2.0).unwrap();
        assert!(matches!(pipeline.commit(), Err(SessionError::Processing(_))));

        assert_eq!(session.thumbnail().cloned(), before);
        assert_eq!(*session.adjustments(), AdjustmentParameters::default());
    }

    #[test]
    fn remove_background_refreshes_thumbnail() {
        let mut session = mock_session(vec![solid_image(60, 60, [255, 255, 255, 255])]);
        session.upload(&upload()).unwrap();

        session.remove_background(None).unwrap();
        let ops = session.backend().get_operations();
        assert!(matches!(
            &ops[2],
            RecordedOp::RemoveBackground {
                threshold: 200,
                ..
            }
        ));
        assert!(matches!(&ops[3], RecordedOp::CircularCrop { .. }));
    }

    #[test]
    fn remove_background_without_photo_errors() {
        let mut session = mock_session(vec![]);
        assert!(matches!(
            session.remove_background(Some(Threshold(10))),
            Err(SessionError::NoImage)
        ));
    }

    #[test]
    fn remove_clears_everything() {
        let mut session = mock_session(vec![solid_image(30, 30, [0, 0, 0, 255])]);
        session.upload(&upload()).unwrap();
        let mut pipeline = session.adjust().unwrap();
        pipeline.set_scale(1.2).unwrap();
        pipeline.commit().unwrap();

        session.remove();
        assert!(!session.has_image());
        assert!(session.thumbnail().is_none());
        assert!(session.region().is_none());
        assert_eq!(*session.adjustments(), AdjustmentParameters::default());
        assert!(session.export_avatar().is_placeholder());
    }

    #[test]
    fn upload_resets_adjustments() {
        let mut session = mock_session(vec![
            solid_image(30, 30, [0, 0, 0, 255]),
            solid_image(30, 30, [0, 0, 0, 255]),
        ]);
        session.upload(&upload()).unwrap();
        let mut pipeline = session.adjust().unwrap();
        pipeline.set_contrast(2.0).unwrap();
        pipeline.commit().unwrap();

        session.upload(&upload()).unwrap();
        assert_eq!(*session.adjustments(), AdjustmentParameters::default());
    }

    #[test]
    fn real_backend_upload_round_trip() {
        let mut session = ImageSession::with_detector(
            DetectorCapability::Unavailable,
            Config::default(),
        );
        session
            .upload(&png_upload("me.png", &solid_image(120, 80, [9, 8, 7, 255])))
            .unwrap();
        let thumb = session.thumbnail().unwrap();
        assert_eq!(thumb.dimensions(), (100, 100));
        assert_eq!(thumb.pixels().get_pixel(50, 50).0, [9, 8, 7, 255]);
    }
}
