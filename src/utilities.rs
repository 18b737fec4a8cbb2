//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion that the FFmpeg
//! backed source needs but that do not belong to its public surface.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// FFmpeg's `AV_NOPTS_VALUE`: "no timestamp".
pub(crate) const NO_TIMESTAMP: i64 = i64::MIN;

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width ×
/// `bytes_per_pixel`). The padding is stripped so the result can be handed to
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert a rational frame rate to frames per second.
///
/// Returns `0.0` for rates with a zero numerator or denominator.
pub(crate) fn rational_to_fps(rate: Rational) -> f64 {
    if rate.numerator() == 0 || rate.denominator() == 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

/// Rescale a timestamp from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert seconds to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input_context.seek()` (via `avformat_seek_file` with `stream_index = -1`)
/// expects AV_TIME_BASE units, not the stream time base.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds * 1_000_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::Rational;

    use super::{pts_to_seconds, rational_to_fps, seconds_to_seek_timestamp};

    #[test]
    fn rational_rates() {
        assert_eq!(rational_to_fps(Rational::new(30, 1)), 30.0);
        assert!((rational_to_fps(Rational::new(30_000, 1_001)) - 29.97).abs() < 0.001);
        assert_eq!(rational_to_fps(Rational::new(0, 1)), 0.0);
        assert_eq!(rational_to_fps(Rational::new(25, 0)), 0.0);
    }

    #[test]
    fn pts_rescaling() {
        assert_eq!(pts_to_seconds(90_000, Rational::new(1, 90_000)), 1.0);
        assert_eq!(pts_to_seconds(512, Rational::new(1, 15_360)), 512.0 / 15_360.0);
    }

    #[test]
    fn seek_timestamps_are_microseconds() {
        assert_eq!(seconds_to_seek_timestamp(0.0), 0);
        assert_eq!(seconds_to_seek_timestamp(1.5), 1_500_000);
    }
}
