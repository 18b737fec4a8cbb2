//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened and cached for its lifetime.

use std::time::Duration;

/// Metadata for the video stream frames are extracted from.
///
/// # Example
///
/// ```no_run
/// use vidframes::VideoSource;
///
/// let source = VideoSource::open("input.mp4")?;
/// let metadata = source.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// # Ok::<(), vidframes::ExtractError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Native frame rate (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Container-level duration, or [`Duration::ZERO`] when unknown.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Estimated number of frames, from duration and frame rate.
    pub fn estimated_frame_count(&self) -> u64 {
        (self.duration.as_secs_f64() * self.frames_per_second) as u64
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::VideoMetadata;

    #[test]
    fn frame_count_estimate() {
        let metadata = VideoMetadata {
            width: 320,
            height: 240,
            frames_per_second: 30.0,
            duration: Duration::from_secs(5),
            codec: "h264".to_string(),
        };
        assert_eq!(metadata.estimated_frame_count(), 150);
    }
}
