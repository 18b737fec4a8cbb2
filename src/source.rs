//! Video sources.
//!
//! [`FrameSource`] is the seam between the extraction loop and whatever
//! produces decoded frames. [`VideoSource`] is the FFmpeg-backed
//! implementation: it opens a file, picks the best video stream, and decodes
//! frames on demand, converting each to an RGB8 [`DynamicImage`].
//!
//! Positioning follows "seek before read" semantics: [`FrameSource::seek`]
//! records where the *next* [`read_frame`](FrameSource::read_frame) should
//! land, and the read skips every frame that lies before that position.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{error::ExtractError, metadata::VideoMetadata, utilities};

/// Forward jumps longer than this use a container seek instead of decoding
/// every intermediate frame.
pub const FORWARD_SEEK_THRESHOLD: Duration = Duration::from_secs(2);

/// Consecutive unreadable packets tolerated before decoding gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// Maps decoded frame timestamps to seconds from the first frame of the
/// stream.
///
/// The origin is the later of the stream's declared start time and the
/// timestamp of the first frame that actually decodes, so streams whose
/// leading frames are dropped by the decoder still start at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Timeline {
    start_seconds: f64,
    origin: Option<f64>,
    fps: f64,
}

impl Timeline {
    fn new(start_seconds: f64, fps: f64) -> Self {
        Self {
            start_seconds,
            origin: None,
            fps,
        }
    }

    /// Seconds of a decoded frame relative to the origin.
    ///
    /// `absolute` is the frame's presentation time in stream seconds, if it
    /// has one; otherwise `decoded_count` frames at the native rate are
    /// assumed.
    fn frame_seconds(&mut self, absolute: Option<f64>, decoded_count: u64) -> f64 {
        match absolute {
            Some(absolute) => {
                let start_seconds = self.start_seconds;
                let origin = *self.origin.get_or_insert(absolute.max(start_seconds));
                absolute - origin
            }
            None => decoded_count as f64 / self.fps,
        }
    }

    /// Stream time of a position measured from the origin.
    fn to_stream_seconds(&self, seconds: f64) -> f64 {
        self.origin.unwrap_or(self.start_seconds) + seconds
    }

    /// Number of frames preceding `seconds`, used to resume the fallback
    /// count for frames without a timestamp after a reposition.
    fn frames_before(&self, seconds: f64) -> u64 {
        (seconds * self.fps).round().max(0.0) as u64
    }
}

/// Whether reaching `target` needs a container seek rather than decoding
/// forward from the last delivered frame.
fn needs_reposition(last_delivered: Option<f64>, target: f64, half_frame: f64) -> bool {
    let threshold = FORWARD_SEEK_THRESHOLD.as_secs_f64();
    match last_delivered {
        Some(last) => target + half_frame < last || target - last > threshold,
        None => target > threshold,
    }
}

/// A sequential source of decoded frames.
///
/// Implemented by [`VideoSource`]; tests and other callers can provide their
/// own implementation to drive a [`FrameExtractor`](crate::FrameExtractor).
pub trait FrameSource {
    /// Native frame rate of the source, in frames per second.
    fn native_fps(&self) -> f64;

    /// Set the position of the next read, measured from the start of the
    /// stream.
    ///
    /// The next [`read_frame`](FrameSource::read_frame) returns the first
    /// frame at or after `position`.
    fn seek(&mut self, position: Duration) -> Result<(), ExtractError>;

    /// Decode the next frame.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>, ExtractError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn native_fps(&self) -> f64 {
        (**self).native_fps()
    }

    fn seek(&mut self, position: Duration) -> Result<(), ExtractError> {
        (**self).seek(position)
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, ExtractError> {
        (**self).read_frame()
    }
}

/// An opened video file.
///
/// Holds the demuxer, a decoder for the best video stream, and the pending
/// seek target. The file is closed when the source is dropped.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use vidframes::{FrameSource, VideoSource};
///
/// let mut source = VideoSource::open("input.mp4")?;
/// source.seek(Duration::from_secs(2))?;
/// if let Some(frame) = source.read_frame()? {
///     frame.save("at_two_seconds.png")?;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    video_stream_index: usize,
    time_base: Rational,
    timeline: Timeline,
    metadata: VideoMetadata,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    /// Number of frames received from the decoder since the last flush.
    decoded_count: u64,
    /// Time of the last frame handed out, relative to stream start.
    last_delivered: Option<f64>,
    /// Pending seek target in seconds, applied on the next read.
    target: Option<f64>,
    eof_sent: bool,
    read_errors: u32,
    file_path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("last_delivered", &self.last_delivered)
            .field("target", &self.target)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::SourceUnavailable`] if the file cannot be
    /// opened, has no video stream, its decoder cannot be created, or it
    /// reports a frame rate of zero.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();
        let unavailable =
            |reason: String| ExtractError::SourceUnavailable(format!("{}: {reason}", path.display()));

        log::debug!("Opening video source: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| unavailable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| unavailable(error.to_string()))?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let (video_stream_index, time_base, start_time, frames_per_second, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or_else(|| unavailable("no video stream found".to_string()))?;

            let frames_per_second = match utilities::rational_to_fps(stream.avg_frame_rate()) {
                fps if fps > 0.0 => fps,
                _ => utilities::rational_to_fps(stream.rate()),
            };

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| unavailable(format!("invalid codec parameters: {error}")))?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| unavailable(format!("failed to create decoder: {error}")))?;

            (
                stream.index(),
                stream.time_base(),
                stream.start_time(),
                frames_per_second,
                decoder,
            )
        };

        if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
            return Err(unavailable("stream reports a frame rate of zero".to_string()));
        }

        let start_seconds = if start_time == utilities::NO_TIMESTAMP {
            0.0
        } else {
            utilities::pts_to_seconds(start_time, time_base)
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            duration,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        };

        log::debug!(
            "Video stream {video_stream_index}: {}x{} @ {:.3} fps [{}]",
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            time_base,
            timeline: Timeline::new(start_seconds, frames_per_second),
            metadata,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            decoded_count: 0,
            last_delivered: None,
            target: None,
            eof_sent: false,
            read_errors: 0,
            file_path,
        })
    }

    /// Metadata of the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Seek the demuxer to the keyframe at or before `seconds` and reset the
    /// decoder.
    fn reposition(&mut self, seconds: f64) -> Result<(), ExtractError> {
        let timestamp =
            utilities::seconds_to_seek_timestamp(self.timeline.to_stream_seconds(seconds));
        log::trace!("Seeking {} to {seconds:.3}s", self.file_path.display());

        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.decoded_count = self.timeline.frames_before(seconds);
        self.last_delivered = None;
        Ok(())
    }

    /// Presentation time of `decoded_frame`, relative to the first frame.
    fn current_frame_seconds(&mut self) -> f64 {
        let absolute = self
            .decoded_frame
            .timestamp()
            .or_else(|| self.decoded_frame.pts())
            .map(|pts| utilities::pts_to_seconds(pts, self.time_base));
        self.timeline.frame_seconds(absolute, self.decoded_count)
    }

    /// Convert `decoded_frame` to an RGB8 image.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, ExtractError> {
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        let stale = self.scaler.as_ref().is_some_and(|scaler| {
            scaler.input().width != width
                || scaler.input().height != height
                || scaler.input().format != self.decoded_frame.format()
        });
        if stale {
            self.scaler = None;
        }

        let scaler = match &mut self.scaler {
            Some(scaler) => scaler,
            empty => empty.insert(ScalingContext::get(
                self.decoded_frame.format(),
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?),
        };
        scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = utilities::frame_to_buffer(&self.rgb_frame, width, height, 3);
        let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            ExtractError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl FrameSource for VideoSource {
    fn native_fps(&self) -> f64 {
        self.metadata.frames_per_second
    }

    fn seek(&mut self, position: Duration) -> Result<(), ExtractError> {
        let target = position.as_secs_f64();
        let half_frame = 0.5 / self.metadata.frames_per_second;

        // Without a container seek the next read still decodes forward to the
        // target, or takes the next frame when the target is behind.
        if needs_reposition(self.last_delivered, target, half_frame) {
            if let Err(error) = self.reposition(target) {
                log::warn!(
                    "Seek to {target:.3}s failed in {}, decoding forward: {error}",
                    self.file_path.display()
                );
            }
        }

        self.target = Some(target);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, ExtractError> {
        let half_frame = 0.5 / self.metadata.frames_per_second;

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let seconds = self.current_frame_seconds();
                self.decoded_count += 1;

                // Frames before the requested position are decoded and dropped.
                if self.target.is_some_and(|target| seconds + half_frame < target) {
                    continue;
                }

                self.target = None;
                self.last_delivered = Some(seconds);
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    self.read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            ExtractError::VideoDecodeError(error.to_string())
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.read_errors += 1;
                    if self.read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(ExtractError::VideoDecodeError(format!(
                            "{} consecutive packet read failures, last: {error}",
                            self.read_errors
                        )));
                    }
                    log::trace!("Skipping unreadable packet: {error}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Timeline, needs_reposition};

    const HALF_FRAME: f64 = 0.5 / 30.0;

    #[test]
    fn origin_is_first_decoded_frame_when_later_than_start() {
        let mut timeline = Timeline::new(0.0, 30.0);

        assert_eq!(timeline.frame_seconds(Some(0.1), 0), 0.0);
        let second = timeline.frame_seconds(Some(0.1 + 1.0 / 30.0), 1);
        assert!((second - 1.0 / 30.0).abs() < 1e-9);
        assert!((timeline.to_stream_seconds(1.0) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn origin_is_start_time_when_first_frame_is_earlier() {
        let mut timeline = Timeline::new(1.4, 30.0);

        assert!((timeline.frame_seconds(Some(1.4), 0)).abs() < 1e-9);
        assert!((timeline.to_stream_seconds(2.0) - 3.4).abs() < 1e-9);
    }

    #[test]
    fn late_first_frame_does_not_trigger_backward_seeks() {
        // First frame decodes at 0.1s of stream time; sampling every frame.
        let mut timeline = Timeline::new(0.0, 30.0);
        let mut last = None;

        for index in 0..10u64 {
            let target = index as f64 / 30.0;
            assert!(
                !needs_reposition(last, target, HALF_FRAME),
                "frame {index} should be reached by decoding forward",
            );
            let absolute = 0.1 + index as f64 / 30.0;
            last = Some(timeline.frame_seconds(Some(absolute), index));
        }
    }

    #[test]
    fn reposition_rules() {
        assert!(!needs_reposition(None, 0.0, HALF_FRAME));
        assert!(needs_reposition(None, 4.0, HALF_FRAME));
        assert!(needs_reposition(Some(3.0), 0.0, HALF_FRAME));
        assert!(!needs_reposition(Some(1.0), 1.0 - HALF_FRAME / 2.0, HALF_FRAME));
        assert!(!needs_reposition(Some(1.0), 2.9, HALF_FRAME));
        assert!(needs_reposition(Some(1.0), 3.5, HALF_FRAME));
    }

    #[test]
    fn fallback_count_resumes_at_seek_position() {
        let mut timeline = Timeline::new(0.0, 30.0);
        let decoded_count = timeline.frames_before(4.0);

        assert_eq!(decoded_count, 120);
        assert!((timeline.frame_seconds(None, decoded_count) - 4.0).abs() < 1e-9);
    }
}
