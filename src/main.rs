use clap::{Parser, Subcommand};
use headshot::config;
use headshot::detect::{BoundingBox, DetectorCapability, FixedDetector, SidecarDetector};
use headshot::imaging::{AdjustmentParameters, ImageBackend, RasterImage, Threshold};
use headshot::output;
use headshot::session::ImageSession;
use headshot::upload::Upload;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Shared flags for commands that load a photo.
#[derive(clap::Args, Clone)]
struct PhotoArgs {
    /// Portrait to process (JPEG, PNG, WebP, TIFF)
    photo: PathBuf,

    /// Where to write the result: the circular thumbnail, or the preview
    /// image for `preview` [default: <photo>.avatar.png / <photo>.preview.png]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Known face box as x,y,width,height in source pixels
    #[arg(long, value_name = "X,Y,W,H")]
    face: Option<BoundingBox>,
}

/// Adjustment values; unset ones stay at 1.0.
#[derive(clap::Args, Clone)]
struct AdjustArgs {
    /// Zoom about the image center
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Channel multiplier (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    brightness: f64,

    /// Contrast around mid-gray (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    contrast: f64,
}

impl AdjustArgs {
    fn parameters(&self) -> AdjustmentParameters {
        AdjustmentParameters {
            scale: self.scale,
            brightness: self.brightness,
            contrast: self.contrast,
        }
    }
}

#[derive(Parser)]
#[command(name = "headshot")]
#[command(about = "Face-aware circular profile photos")]
#[command(long_about = "\
Face-aware circular profile photos

Crops a portrait into a small circular thumbnail centered on the face.

Face location (first available wins):
  --face x,y,w,h        box given on the command line
  <photo>.face.json     sidecar next to the photo: {\"x\":..,\"y\":..,\"width\":..,\"height\":..}
  center of the image   when neither is present

Run 'headshot gen-config' to generate a documented headshot.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop a circular thumbnail around the face
    Crop(PhotoArgs),
    /// Apply zoom, brightness and contrast, then re-crop
    Adjust {
        #[command(flatten)]
        photo: PhotoArgs,
        #[command(flatten)]
        adjust: AdjustArgs,
        /// Also write the full-resolution adjusted image here
        #[arg(long)]
        working: Option<PathBuf>,
    },
    /// Render an adjustment preview without committing it
    Preview {
        #[command(flatten)]
        photo: PhotoArgs,
        #[command(flatten)]
        adjust: AdjustArgs,
    },
    /// Make near-white background pixels transparent, then re-crop
    RemoveBg {
        #[command(flatten)]
        photo: PhotoArgs,
        /// Channels above this on all of R, G, B are background [default: from config]
        #[arg(long)]
        threshold: Option<u8>,
    },
    /// Print a stock headshot.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Crop(photo) => {
            let session = open_session(&photo, config_path)?;
            let output = thumbnail_path(&photo);
            write_thumbnail(&session, &output)?;
            output::print_crop_output(&session, &output);
        }
        Command::Adjust {
            photo,
            adjust,
            working,
        } => {
            let mut session = open_session(&photo, config_path)?;
            let mut pipeline = session.adjust()?;
            pipeline.set_parameters(adjust.parameters())?;
            pipeline.commit()?;

            if let (Some(path), Some(image)) = (working.as_deref(), session.original()) {
                write_png(session.backend(), image, path)?;
            }
            let output = thumbnail_path(&photo);
            write_thumbnail(&session, &output)?;
            output::print_adjust_output(&session, working.as_deref(), &output);
        }
        Command::Preview { photo, adjust } => {
            let mut session = open_session(&photo, config_path)?;
            let params = adjust.parameters();
            let preview = {
                let mut pipeline = session.adjust()?;
                pipeline.set_parameters(params)?;
                pipeline.preview()?
            };
            let output = photo
                .output
                .clone()
                .unwrap_or_else(|| sibling_path(&photo.photo, "preview.png"));
            write_png(session.backend(), &preview, &output)?;
            output::print_preview_output(&session, &params, &preview, &output);
        }
        Command::RemoveBg { photo, threshold } => {
            let mut session = open_session(&photo, config_path)?;
            let threshold = threshold
                .map(Threshold)
                .unwrap_or_else(|| session.config().threshold());
            session.remove_background(Some(threshold))?;
            let output = thumbnail_path(&photo);
            write_thumbnail(&session, &output)?;
            output::print_background_output(&session, threshold, &output);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Pick the detector: explicit box, then sidecar file, then none.
fn select_detector(photo: &PhotoArgs) -> DetectorCapability {
    if let Some(face) = photo.face {
        debug!(%face, "using face box from command line");
        return DetectorCapability::available(FixedDetector(face));
    }
    match SidecarDetector::locate(&photo.photo) {
        Some(sidecar) => {
            debug!(path = %sidecar.path().display(), "using face sidecar");
            DetectorCapability::available(sidecar)
        }
        None => DetectorCapability::Unavailable,
    }
}

fn open_session(
    photo: &PhotoArgs,
    config_path: Option<&Path>,
) -> Result<ImageSession, Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let mut session = ImageSession::with_detector(select_detector(photo), config);
    let upload = Upload::from_path(&photo.photo)?;
    session.upload(&upload)?;
    Ok(session)
}

fn thumbnail_path(photo: &PhotoArgs) -> PathBuf {
    photo
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&photo.photo, "avatar.png"))
}

/// `dir/portrait.jpg` + `avatar.png` → `dir/portrait.avatar.png`.
fn sibling_path(photo: &Path, suffix: &str) -> PathBuf {
    photo.with_extension(suffix)
}

fn write_thumbnail(session: &ImageSession, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let png = session
        .export_avatar()
        .to_png(session.backend(), session.config().crop.target_size)?;
    std::fs::write(path, png)?;
    Ok(())
}

fn write_png(
    backend: &impl ImageBackend,
    image: &RasterImage,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, backend.encode_png(image)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_help_covers_preview_destination() {
        let cli = Cli::command();
        let preview = cli.find_subcommand("preview").unwrap();
        let output = preview
            .get_arguments()
            .find(|arg| arg.get_id() == "output")
            .unwrap();
        let help = output.get_help().unwrap().to_string();
        assert!(help.contains("preview"), "help was: {help}");
        assert!(help.contains("<photo>.preview.png"), "help was: {help}");
    }

    #[test]
    fn preview_output_flag_parses() {
        let cli = Cli::try_parse_from(["headshot", "preview", "me.jpg", "-o", "p.png"]).unwrap();
        match cli.command {
            Command::Preview { photo, adjust } => {
                assert_eq!(photo.output, Some(PathBuf::from("p.png")));
                assert_eq!(adjust.parameters(), AdjustmentParameters::default());
            }
            _ => panic!("expected preview command"),
        }
    }

    #[test]
    fn face_flag_parses_bounding_box() {
        let cli = Cli::try_parse_from(["headshot", "crop", "me.jpg", "--face", "10,20,40,60"])
            .unwrap();
        match cli.command {
            Command::Crop(photo) => {
                assert_eq!(photo.face.map(|f| (f.x, f.width)), Some((10.0, 40.0)));
            }
            _ => panic!("expected crop command"),
        }
    }
}
