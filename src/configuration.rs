//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that carries the sampling request and the
//! output encoding settings into [`extract`](crate::extract) and
//! [`FrameExtractor`](crate::FrameExtractor).
//!
//! # Example
//!
//! ```
//! use vidframes::{ExtractOptions, ImageFormat};
//!
//! let options = ExtractOptions::new()
//!     .with_fps(2.0)
//!     .with_format(ImageFormat::Png);
//! assert_eq!(options.fps, Some(2.0));
//! ```

use crate::{
    error::ExtractError,
    image_format::{DEFAULT_JPEG_QUALITY, ImageFormat},
};

/// Settings for one extraction run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// Requested sampling rate. `None` extracts every frame.
    pub fps: Option<f64>,
    /// Image format each frame is encoded as.
    pub format: ImageFormat,
    /// JPEG quality (1-100). Ignored for PNG.
    pub jpeg_quality: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fps: None,
            format: ImageFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExtractOptions {
    /// Create options that extract every frame as JPEG (`.jpg`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample at most `fps` frames per second.
    #[must_use]
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Encode frames as `format`.
    #[must_use]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the JPEG quality.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Check the values a caller can get wrong.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidFps`] if `fps` is set and is not a positive,
    ///   finite number.
    /// - [`ExtractError::InvalidQuality`] if `jpeg_quality` is outside `1..=100`.
    pub fn validate(&self) -> Result<(), ExtractError> {
        match self.fps {
            Some(fps) if !(fps.is_finite() && fps > 0.0) => {
                return Err(ExtractError::InvalidFps(fps));
            }
            _ => {}
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExtractError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractOptions;
    use crate::{error::ExtractError, image_format::ImageFormat};

    #[test]
    fn defaults() {
        let options = ExtractOptions::new();
        assert_eq!(options.fps, None);
        assert_eq!(options.format, ImageFormat::Jpg);
        assert_eq!(options.jpeg_quality, 95);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let options = ExtractOptions::new()
            .with_fps(12.5)
            .with_format(ImageFormat::Jpeg)
            .with_jpeg_quality(70);
        assert_eq!(options.fps, Some(12.5));
        assert_eq!(options.format, ImageFormat::Jpeg);
        assert_eq!(options.jpeg_quality, 70);
    }

    #[test]
    fn rejects_non_positive_fps() {
        for fps in [0.0, -0.5, f64::NAN] {
            let result = ExtractOptions::new().with_fps(fps).validate();
            assert!(matches!(result, Err(ExtractError::InvalidFps(_))));
        }
    }

    #[test]
    fn rejects_out_of_range_quality() {
        for quality in [0, 101, 255] {
            let result = ExtractOptions::new().with_jpeg_quality(quality).validate();
            assert!(matches!(result, Err(ExtractError::InvalidQuality(q)) if q == quality));
        }
    }
}
