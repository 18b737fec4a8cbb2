//! # vidframes
//!
//! Dump the frames of a video file, either as image files in a directory or
//! as entries of a single zip archive, sampled at a chosen frame rate.
//!
//! Decoding is done by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate, encoding by the
//! [`image`](https://crates.io/crates/image) crate, and archiving by the
//! [`zip`](https://crates.io/crates/zip) crate.
//!
//! ## Quick Start
//!
//! ### Validate and run, like the command line does
//!
//! ```no_run
//! use vidframes::ExtractRequest;
//!
//! let summary = ExtractRequest::new("input.mp4")
//!     .output_path("out")
//!     .archive(false)
//!     .fps(Some(1.0))
//!     .validate()?
//!     .run()?;
//! println!("{} frames", summary.frame_count);
//! # Ok::<(), vidframes::ExtractError>(())
//! ```
//!
//! ### Iterate encoded frames yourself
//!
//! ```no_run
//! use vidframes::{ExtractOptions, FrameExtractor, ImageFormat, VideoSource};
//!
//! let source = VideoSource::open("input.mp4")?;
//! let options = ExtractOptions::new().with_fps(0.5).with_format(ImageFormat::Png);
//! let mut extractor = FrameExtractor::new(source, &options)?;
//!
//! for frame in extractor.frames() {
//!     let frame = frame?;
//!     std::fs::write(format!("thumb_{}.png", frame.index), &frame.bytes)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Sampling
//!
//! The effective rate is the requested rate clamped to the video's native
//! rate; without a request every frame is extracted. Output frame `i` is the
//! first frame at or after `i * 1000 / effective_fps` milliseconds.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod image_format;
pub mod metadata;
pub mod sampling;
pub mod sink;
pub mod source;
mod utilities;
pub mod validation;

pub use configuration::ExtractOptions;
pub use error::ExtractError;
pub use extractor::{EncodedFrame, EncodedFrames, ExtractionSummary, FrameExtractor, extract};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use image_format::{DEFAULT_JPEG_QUALITY, ImageFormat};
pub use metadata::VideoMetadata;
pub use sampling::SamplingPlan;
pub use sink::{ArchiveSink, DirectorySink, FrameSink, OutputSink, OutputTarget, entry_name};
pub use source::{FrameSource, VideoSource};
pub use validation::{DEFAULT_OUTPUT_NAME, ExtractRequest, ValidatedRequest};
