//! Frame sampling.
//!
//! A [`SamplingPlan`] turns the source's native frame rate and an optional
//! requested rate into the effective rate used for extraction, and maps each
//! output index to the position the source is sought to before reading it.

use std::time::Duration;

use crate::error::ExtractError;

/// The sampling rate actually used for an extraction run.
///
/// The requested rate is clamped to the native rate: asking for more frames
/// per second than the video has never duplicates frames.
///
/// # Example
///
/// ```
/// use vidframes::SamplingPlan;
///
/// let plan = SamplingPlan::new(30.0, Some(60.0))?;
/// assert_eq!(plan.effective_fps(), 30.0);
///
/// let plan = SamplingPlan::new(30.0, Some(2.0))?;
/// assert_eq!(plan.position_millis(3), 1500.0);
/// # Ok::<(), vidframes::ExtractError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPlan {
    native_fps: f64,
    effective_fps: f64,
}

impl SamplingPlan {
    /// Build a plan from the source's native rate and an optional request.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::SourceUnavailable`] if `native_fps` is not a positive,
    ///   finite number.
    /// - [`ExtractError::InvalidFps`] if `requested_fps` is given and is not a
    ///   positive, finite number.
    pub fn new(native_fps: f64, requested_fps: Option<f64>) -> Result<Self, ExtractError> {
        if !(native_fps.is_finite() && native_fps > 0.0) {
            return Err(ExtractError::SourceUnavailable(format!(
                "source reports an unusable frame rate ({native_fps})"
            )));
        }

        let effective_fps = match requested_fps {
            Some(requested) if !(requested.is_finite() && requested > 0.0) => {
                return Err(ExtractError::InvalidFps(requested));
            }
            Some(requested) if requested < native_fps => requested,
            _ => native_fps,
        };

        Ok(Self {
            native_fps,
            effective_fps,
        })
    }

    /// Frame rate reported by the source.
    pub fn native_fps(&self) -> f64 {
        self.native_fps
    }

    /// Frame rate used for extraction, never above [`native_fps`](Self::native_fps).
    pub fn effective_fps(&self) -> f64 {
        self.effective_fps
    }

    /// Position, in milliseconds, of output frame `index`.
    ///
    /// Computed from the index on every call so that non-integral intervals
    /// do not accumulate rounding error.
    pub fn position_millis(&self, index: u64) -> f64 {
        index as f64 * 1000.0 / self.effective_fps
    }

    /// Position of output frame `index` as a [`Duration`].
    pub fn position(&self, index: u64) -> Duration {
        Duration::from_secs_f64(self.position_millis(index) / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::SamplingPlan;
    use crate::error::ExtractError;

    #[test]
    fn no_request_uses_native_rate() {
        for native in [1.0, 23.976, 25.0, 29.97, 30.0, 60.0, 120.0] {
            let plan = SamplingPlan::new(native, None).unwrap();
            assert_eq!(plan.effective_fps(), native);
        }
    }

    #[test]
    fn requests_at_or_above_native_are_clamped() {
        for requested in [30.0, 30.000_001, 60.0, 1_000.0] {
            let plan = SamplingPlan::new(30.0, Some(requested)).unwrap();
            assert_eq!(plan.effective_fps(), 30.0);
        }
    }

    #[test]
    fn requests_below_native_are_used_as_is() {
        for requested in [0.1, 1.0, 12.5, 29.999] {
            let plan = SamplingPlan::new(30.0, Some(requested)).unwrap();
            assert_eq!(plan.effective_fps(), requested);
        }
    }

    #[test]
    fn non_positive_requests_are_rejected() {
        for requested in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = SamplingPlan::new(30.0, Some(requested));
            assert!(matches!(result, Err(ExtractError::InvalidFps(_))));
        }
    }

    #[test]
    fn zero_native_rate_means_source_unavailable() {
        let result = SamplingPlan::new(0.0, None);
        assert!(matches!(result, Err(ExtractError::SourceUnavailable(_))));
    }

    #[test]
    fn positions_are_multiplied_not_accumulated() {
        let plan = SamplingPlan::new(30.0, Some(3.0)).unwrap();

        assert_eq!(plan.position_millis(0), 0.0);
        assert_eq!(plan.position_millis(3), 1000.0);
        assert_eq!(plan.position_millis(999), 333_000.0);
    }

    #[test]
    fn position_duration_matches_millis() {
        let plan = SamplingPlan::new(25.0, None).unwrap();
        assert_eq!(plan.position(25).as_millis(), 1_000);
        assert_eq!(plan.position(1).as_millis(), 40);
    }
}
