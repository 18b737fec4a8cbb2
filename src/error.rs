//! Error types for the `vidframes` crate.
//!
//! This module defines [`ExtractError`], the unified error type returned by
//! every fallible operation in the crate. Pre-run validation failures,
//! decoder problems, encoding failures, and sink write failures each get their
//! own variant so callers can react to them without parsing messages.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `vidframes` operations.
///
/// Every public method that can fail returns `Result<T, ExtractError>`.
/// The first four variants are pre-run validation failures: they are raised
/// before any frame is decoded or any output is created.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The input video path does not exist.
    #[error("Video path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The output directory or archive is already present.
    #[error("Output already exists: {}", .0.display())]
    OutputAlreadyExists(PathBuf),

    /// The requested image format is not one of `png`, `jpeg`, `jpg`.
    #[error("Unsupported image format '{0}' (expected png, jpeg or jpg)")]
    InvalidFormat(String),

    /// The requested sampling rate is not a strictly positive number.
    #[error("Invalid fps {0}: must be a finite number greater than zero")]
    InvalidFps(f64),

    /// The JPEG quality is outside `1..=100`.
    #[error("Invalid JPEG quality {0}: must be between 1 and 100")]
    InvalidQuality(u8),

    /// The video could not be opened, or it reports no usable frame rate.
    #[error("Video source unavailable: {0}")]
    SourceUnavailable(String),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A decoded frame could not be encoded into the target image format.
    #[error("Failed to encode frame {index}: {source}")]
    EncodeError {
        /// Index of the frame that failed to encode.
        index: u64,
        /// Error reported by the image encoder.
        #[source]
        source: ImageError,
    },

    /// Writing an entry to the output sink failed.
    #[error("Failed to write output: {0}")]
    SinkWriteError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl From<FfmpegError> for ExtractError {
    fn from(error: FfmpegError) -> Self {
        ExtractError::FfmpegError(error.to_string())
    }
}

impl From<ZipError> for ExtractError {
    fn from(error: ZipError) -> Self {
        ExtractError::SinkWriteError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::ExtractError;

    #[test]
    fn validation_messages_name_the_problem() {
        let error = ExtractError::InputNotFound(PathBuf::from("missing.mp4"));
        assert!(error.to_string().contains("missing.mp4"));

        let error = ExtractError::InvalidFormat("bmp".to_string());
        assert!(error.to_string().contains("'bmp'"));

        let error = ExtractError::InvalidFps(-2.0);
        assert!(error.to_string().contains("-2"));
    }

    #[test]
    fn zip_errors_become_sink_write_errors() {
        let error: ExtractError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(error, ExtractError::SinkWriteError(_)));
    }
}
