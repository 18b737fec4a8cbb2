//! Frame extraction.
//!
//! [`FrameExtractor`] drives a [`FrameSource`] according to a
//! [`SamplingPlan`]: for each output index it positions the source, reads one
//! frame, and encodes it. [`FrameExtractor::frames`] exposes that loop as a
//! lazy iterator of [`EncodedFrame`]s; [`extract`] consumes it into a
//! [`FrameSink`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use vidframes::{ExtractOptions, ImageFormat, OutputTarget, VideoSource};
//!
//! let source = VideoSource::open("input.mp4")?;
//! let mut sink = OutputTarget::new(Path::new("."), "frames", true).create()?;
//! let options = ExtractOptions::new().with_fps(1.0).with_format(ImageFormat::Png);
//!
//! let summary = vidframes::extract(source, &mut sink, &options)?;
//! println!("{} frames in {:?}", summary.frame_count, summary.elapsed);
//! # Ok::<(), vidframes::ExtractError>(())
//! ```

use std::time::{Duration, Instant};

use crate::{
    configuration::ExtractOptions,
    error::ExtractError,
    image_format::ImageFormat,
    sampling::SamplingPlan,
    sink::FrameSink,
    source::FrameSource,
};

/// One encoded frame, ready to be written to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Zero-based output index.
    pub index: u64,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Outcome of a completed extraction run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct ExtractionSummary {
    /// Number of entries written.
    pub frame_count: u64,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Sampling rate that was used.
    pub effective_fps: f64,
}

/// Samples and encodes frames from a source.
#[derive(Debug)]
pub struct FrameExtractor<S> {
    source: S,
    plan: SamplingPlan,
    format: ImageFormat,
    jpeg_quality: u8,
}

impl<S: FrameSource> FrameExtractor<S> {
    /// Plan an extraction from `source`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::SourceUnavailable`] if the source reports no usable
    ///   frame rate.
    /// - [`ExtractError::InvalidFps`] / [`ExtractError::InvalidQuality`] for
    ///   out-of-range options.
    pub fn new(source: S, options: &ExtractOptions) -> Result<Self, ExtractError> {
        options.validate()?;
        let plan = SamplingPlan::new(source.native_fps(), options.fps)?;

        log::debug!(
            "Sampling at {:.3} fps (native {:.3}, requested {:?})",
            plan.effective_fps(),
            plan.native_fps(),
            options.fps,
        );

        Ok(Self {
            source,
            plan,
            format: options.format,
            jpeg_quality: options.jpeg_quality,
        })
    }

    /// The sampling plan in use.
    pub fn plan(&self) -> &SamplingPlan {
        &self.plan
    }

    /// Image format frames are encoded as.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Lazily sample and encode frames.
    ///
    /// The iterator is finite and cannot be restarted: it ends at the end of
    /// the source, and after yielding an error it yields nothing more.
    pub fn frames(&mut self) -> EncodedFrames<'_, S> {
        EncodedFrames {
            source: &mut self.source,
            plan: self.plan,
            format: self.format,
            jpeg_quality: self.jpeg_quality,
            next_index: 0,
            done: false,
        }
    }

    /// Give the source back.
    pub fn into_source(self) -> S {
        self.source
    }
}

/// Iterator returned by [`FrameExtractor::frames`].
pub struct EncodedFrames<'a, S> {
    source: &'a mut S,
    plan: SamplingPlan,
    format: ImageFormat,
    jpeg_quality: u8,
    next_index: u64,
    done: bool,
}

impl<S: FrameSource> Iterator for EncodedFrames<'_, S> {
    type Item = Result<EncodedFrame, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let index = self.next_index;

        // Positioning is best effort: the read still returns the next frame.
        if let Err(error) = self.source.seek(self.plan.position(index)) {
            log::warn!("Could not position frame {index}: {error}");
        }

        // A failed read ends the sequence; it does not fail the run.
        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(error) => {
                log::warn!("Stopping at frame {index}: {error}");
                self.done = true;
                return None;
            }
        };

        match self.format.encode(&frame, self.jpeg_quality) {
            Ok(bytes) => {
                self.next_index += 1;
                Some(Ok(EncodedFrame { index, bytes }))
            }
            Err(source) => {
                self.done = true;
                Some(Err(ExtractError::EncodeError { index, source }))
            }
        }
    }
}

impl<S: FrameSource> std::iter::FusedIterator for EncodedFrames<'_, S> {}

/// Extract every sampled frame of `source` into `sink`.
///
/// The sink is finished exactly once, whether the run succeeds or not.
/// Entries written before a failure stay in place.
///
/// # Errors
///
/// - Any error from [`FrameExtractor::new`].
/// - [`ExtractError::EncodeError`] if a frame cannot be encoded.
/// - [`ExtractError::SinkWriteError`] if an entry cannot be written or the
///   sink cannot be closed.
pub fn extract<S, K>(
    source: S,
    sink: &mut K,
    options: &ExtractOptions,
) -> Result<ExtractionSummary, ExtractError>
where
    S: FrameSource,
    K: FrameSink + ?Sized,
{
    let start = Instant::now();

    let written = FrameExtractor::new(source, options).and_then(|mut extractor| {
        let effective_fps = extractor.plan().effective_fps();
        let extension = extractor.format().extension();

        let mut frame_count: u64 = 0;
        for frame in extractor.frames() {
            let frame = frame?;
            sink.write_entry(frame.index, &frame.bytes, extension)?;
            frame_count += 1;
        }
        Ok((frame_count, effective_fps))
    });
    let finished = sink.finish();

    let (frame_count, effective_fps) = match written {
        Ok(written) => written,
        Err(error) => {
            if let Err(finish_error) = finished {
                log::warn!("Failed to close output after an error: {finish_error}");
            }
            return Err(error);
        }
    };
    finished?;

    let summary = ExtractionSummary {
        frame_count,
        elapsed: start.elapsed(),
        effective_fps,
    };
    log::info!(
        "Extracted {} frame(s) at {:.3} fps in {:.3}s",
        summary.frame_count,
        summary.effective_fps,
        summary.elapsed.as_secs_f64(),
    );
    Ok(summary)
}
