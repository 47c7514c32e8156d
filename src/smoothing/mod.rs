//! Temporal smoothing of per-frame emotion detections.
//!
//! Raw classifier output flickers between labels from one frame to the next.
//! The smoothers here keep a short window of recent detections and report a
//! stable "current emotion" recomputed on every new detection.

/// Shared bounded detection window
pub mod window;

/// Majority vote over the window
pub mod majority;

/// Confidence-weighted score averaging over the window
pub mod weighted;

use crate::{
    constants::{DEFAULT_SMOOTHING_WINDOW, MAX_SMOOTHING_WINDOW},
    emotion::{Detection, Emotion},
    Error, Result,
};

/// Output of a smoother: the stabilised emotion and how sure we are about it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedEmotion {
    pub emotion: Emotion,
    pub confidence: f64,
}

impl SmoothedEmotion {
    /// Result reported before any detection has been seen
    pub const EMPTY: SmoothedEmotion = SmoothedEmotion {
        emotion: Emotion::Neutral,
        confidence: 0.0,
    };
}

impl Default for SmoothedEmotion {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Trait for all emotion smoothers
pub trait EmotionSmoother: Send + Sync {
    /// Add a detection (in capture order) and return the new smoothed value
    fn push(&mut self, detection: &Detection) -> SmoothedEmotion;

    /// Smoothed value for the current window without adding anything
    fn current(&self) -> SmoothedEmotion;

    /// Drop all history
    fn reset(&mut self);

    /// Resize the window, dropping the oldest detections if it shrinks
    fn set_window_size(&mut self, window_size: usize) -> Result<()>;

    fn window_size(&self) -> usize;

    /// Number of detections currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn name(&self) -> &str;
}

/// Smoother that reports the most recent detection unchanged
#[derive(Debug, Default)]
pub struct PassThroughSmoother {
    latest: Option<SmoothedEmotion>,
}

impl EmotionSmoother for PassThroughSmoother {
    fn push(&mut self, detection: &Detection) -> SmoothedEmotion {
        let smoothed = SmoothedEmotion {
            emotion: detection.emotion,
            confidence: detection.confidence,
        };
        self.latest = Some(smoothed);
        smoothed
    }

    fn current(&self) -> SmoothedEmotion {
        self.latest.unwrap_or_default()
    }

    fn reset(&mut self) {
        self.latest = None;
    }

    fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        validate_window_size(window_size)?;
        log::debug!("PassThroughSmoother ignores window size {window_size}");
        Ok(())
    }

    fn window_size(&self) -> usize {
        1
    }

    fn len(&self) -> usize {
        usize::from(self.latest.is_some())
    }

    fn name(&self) -> &str {
        "PassThroughSmoother"
    }
}

/// Check a window size against the accepted range
pub fn validate_window_size(window_size: usize) -> Result<()> {
    if window_size == 0 || window_size > MAX_SMOOTHING_WINDOW {
        return Err(Error::SmoothingError(format!(
            "Window size must be between 1 and {MAX_SMOOTHING_WINDOW}, got {window_size}"
        )));
    }
    Ok(())
}

fn parse_window(smoother_type: &str, param: Option<&str>) -> Result<usize> {
    let Some(raw) = param else {
        return Ok(DEFAULT_SMOOTHING_WINDOW);
    };
    let window_size = raw.trim().parse::<usize>().map_err(|_| {
        Error::SmoothingError(format!("Window size for {smoother_type} must be a positive integer, got '{raw}'"))
    })?;
    validate_window_size(window_size)?;
    Ok(window_size)
}

/// Create a smoother from a spec string: `name` or `name:window`.
///
/// Recognised names are `majority`, `weighted` (alias `confidence`) and
/// `none` (aliases `latest`, `passthrough`).
pub fn create_smoother(spec: &str) -> Result<Box<dyn EmotionSmoother>> {
    let lowered = spec.trim().to_lowercase();
    let mut parts = lowered.split(':');
    let name = parts.next().unwrap_or_default();
    let param = parts.next();
    if parts.next().is_some() {
        return Err(Error::SmoothingError(format!("Too many parameters in smoother spec: {spec}")));
    }

    match name {
        "majority" | "majority_vote" | "vote" => {
            let window_size = parse_window(name, param)?;
            Ok(Box::new(majority::MajorityVoteSmoother::new(window_size)))
        }
        "weighted" | "confidence" | "confidence_weighted" => {
            let window_size = parse_window(name, param)?;
            Ok(Box::new(weighted::ConfidenceWeightedSmoother::new(window_size)))
        }
        "none" | "latest" | "passthrough" => {
            if param.is_some() {
                return Err(Error::SmoothingError(format!("{name} smoother takes no window size")));
            }
            Ok(Box::new(PassThroughSmoother::default()))
        }
        _ => Err(Error::SmoothingError(format!("Unknown smoother type: {spec}"))),
    }
}
