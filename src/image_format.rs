//! Output image formats.
//!
//! [`ImageFormat`] names the three formats a frame can be written as and knows
//! how to turn a decoded [`DynamicImage`] into the bytes of one sink entry.
//! `jpeg` and `jpg` produce identical data and differ only in the entry
//! extension.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::Cursor,
    str::FromStr,
};

use image::{DynamicImage, ImageError, codecs::jpeg::JpegEncoder};

use crate::error::ExtractError;

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Image format for extracted frames.
///
/// Parse one from user input with [`str::parse`]:
///
/// ```
/// use vidframes::ImageFormat;
///
/// let format: ImageFormat = "png".parse().unwrap();
/// assert_eq!(format.extension(), "png");
/// assert!("bmp".parse::<ImageFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// Lossless PNG.
    Png,
    /// JPEG, written with a `.jpeg` extension.
    Jpeg,
    /// JPEG, written with a `.jpg` extension. This is the default.
    #[default]
    Jpg,
}

impl ImageFormat {
    /// All recognised formats, in the order they are listed to users.
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Jpg];

    /// File extension used for sink entries, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Jpg => "jpg",
        }
    }

    /// Encode a frame into this format.
    ///
    /// `jpeg_quality` is ignored for PNG. JPEG output is always 8-bit RGB;
    /// frames carrying an alpha channel are flattened first.
    pub fn encode(self, frame: &DynamicImage, jpeg_quality: u8) -> Result<Vec<u8>, ImageError> {
        let mut buffer = Vec::new();
        match self {
            ImageFormat::Png => {
                frame.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
            }
            ImageFormat::Jpeg | ImageFormat::Jpg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
                match frame {
                    DynamicImage::ImageRgb8(rgb) => rgb.write_with_encoder(encoder)?,
                    DynamicImage::ImageLuma8(gray) => gray.write_with_encoder(encoder)?,
                    other => other.to_rgb8().write_with_encoder(encoder)?,
                }
            }
        }
        Ok(buffer)
    }
}

impl FromStr for ImageFormat {
    type Err = ExtractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_start_matches('.');
        ImageFormat::ALL
            .into_iter()
            .find(|format| trimmed.eq_ignore_ascii_case(format.extension()))
            .ok_or_else(|| ExtractError::InvalidFormat(value.to_string()))
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}
