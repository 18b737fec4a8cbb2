//! Pre-run validation.
//!
//! [`ExtractRequest`] holds the raw, user-facing inputs of one run (paths,
//! output name, format string). [`ExtractRequest::validate`] performs every
//! check that must pass before any frame is decoded or any output is created,
//! and yields a [`ValidatedRequest`] that can be [`run`](ValidatedRequest::run).
//!
//! # Example
//!
//! ```no_run
//! use vidframes::ExtractRequest;
//!
//! let summary = ExtractRequest::new("input.mp4")
//!     .output_name("holiday")
//!     .format("png")
//!     .fps(Some(2.0))
//!     .validate()?
//!     .run()?;
//! println!("finished in {:?}", summary.elapsed);
//! # Ok::<(), vidframes::ExtractError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    configuration::ExtractOptions,
    error::ExtractError,
    extractor::{self, ExtractionSummary},
    image_format::{DEFAULT_JPEG_QUALITY, ImageFormat},
    sink::{ARCHIVE_EXTENSION, OutputTarget},
    source::VideoSource,
};

/// Default name of the output directory or archive stem.
pub const DEFAULT_OUTPUT_NAME: &str = "frames";

/// Unvalidated inputs of one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    /// Input video file.
    pub video_path: PathBuf,
    /// Directory the output is created in.
    pub output_path: PathBuf,
    /// Output directory name, or archive name without `.zip`.
    pub output_name: String,
    /// Write a zip archive (`true`) or a directory (`false`).
    pub archive: bool,
    /// Requested sampling rate; `None` extracts every frame.
    pub fps: Option<f64>,
    /// Image format name (`png`, `jpeg`, `jpg`).
    pub format: String,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl ExtractRequest {
    /// A request for every frame of `video_path`, written as JPEG into
    /// `./frames.zip`.
    pub fn new<P: Into<PathBuf>>(video_path: P) -> Self {
        Self {
            video_path: video_path.into(),
            output_path: PathBuf::from("."),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            archive: true,
            fps: None,
            format: ImageFormat::default().extension().to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the directory the output is created in.
    #[must_use]
    pub fn output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    /// Set the output directory name or archive stem.
    #[must_use]
    pub fn output_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_name = name.into();
        self
    }

    /// Choose between archive (`true`) and directory (`false`) output.
    #[must_use]
    pub fn archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    /// Set the requested sampling rate.
    #[must_use]
    pub fn fps(mut self, fps: Option<f64>) -> Self {
        self.fps = fps;
        self
    }

    /// Set the image format name.
    #[must_use]
    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }

    /// Set the JPEG quality.
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Run every pre-run check.
    ///
    /// Checks, in order: the video exists; neither `<name>` nor `<name>.zip`
    /// exists in the output directory; the format is recognised; the fps, if
    /// given, is a positive number; the JPEG quality is in range. Nothing is
    /// opened or created.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InputNotFound`], [`ExtractError::OutputAlreadyExists`],
    /// [`ExtractError::InvalidFormat`], [`ExtractError::InvalidFps`] or
    /// [`ExtractError::InvalidQuality`].
    pub fn validate(&self) -> Result<ValidatedRequest, ExtractError> {
        if !self.video_path.exists() {
            return Err(ExtractError::InputNotFound(self.video_path.clone()));
        }

        let target = OutputTarget::new(&self.output_path, &self.output_name, self.archive);
        for sibling in sibling_outputs(&self.output_path, &self.output_name) {
            if sibling.exists() {
                return Err(ExtractError::OutputAlreadyExists(sibling));
            }
        }

        let format: ImageFormat = self.format.parse()?;

        let options = ExtractOptions {
            fps: self.fps,
            format,
            jpeg_quality: self.jpeg_quality,
        };
        options.validate()?;

        Ok(ValidatedRequest {
            video_path: self.video_path.clone(),
            target,
            options,
        })
    }
}

/// Both possible outputs for a name: `<name>` and `<name>.zip`.
fn sibling_outputs(output_path: &Path, output_name: &str) -> [PathBuf; 2] {
    [
        output_path.join(output_name),
        output_path.join(format!("{output_name}.{ARCHIVE_EXTENSION}")),
    ]
}

/// A request that passed [`ExtractRequest::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    video_path: PathBuf,
    target: OutputTarget,
    options: ExtractOptions,
}

impl ValidatedRequest {
    /// Input video file.
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Where output is written.
    pub fn target(&self) -> &OutputTarget {
        &self.target
    }

    /// Extraction settings.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Open the video, create the output, and extract.
    ///
    /// The video is opened before the output is created, so an unreadable
    /// video leaves nothing behind.
    ///
    /// # Errors
    ///
    /// [`ExtractError::SourceUnavailable`] if the video cannot be opened, or
    /// any error from [`extract`](crate::extract).
    pub fn run(&self) -> Result<ExtractionSummary, ExtractError> {
        let source = VideoSource::open(&self.video_path)?;
        let mut sink = self.target.create()?;

        log::info!(
            "Extracting {} -> {}",
            self.video_path.display(),
            self.target.path().display()
        );
        extractor::extract(source, &mut sink, &self.options)
    }
}
