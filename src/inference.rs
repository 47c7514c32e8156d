//! Boundary between the detection library and the lighting core.
//!
//! Anything that can turn a frame into an emotion label implements
//! [`InferenceAdapter`]. The rest of the crate only ever sees the
//! [`Detection`] values produced by [`to_detection`], so the classifier can be
//! swapped without touching smoothing, mapping or logging.

use crate::{
    emotion::{clamp_unit, Detection, Emotion, EmotionScores},
    Result,
};
use chrono::{DateTime, Utc};
use log::warn;

/// Unvalidated classifier output for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Label as emitted by the model
    pub label: String,
    pub confidence: f32,
    /// Per-label probabilities, in model order
    pub scores: Vec<(String, f32)>,
}

/// Capability: given a frame, optionally produce an emotion label
pub trait InferenceAdapter {
    type Frame;

    /// `Ok(None)` means no face was found in this frame
    fn infer(&mut self, frame: &Self::Frame) -> Result<Option<RawDetection>>;

    fn name(&self) -> &str;
}

/// Validate raw output: unknown labels become neutral and confidence is
/// clamped into [0, 1]. Scores for unknown labels are dropped.
#[must_use]
pub fn to_detection(raw: &RawDetection, timestamp: DateTime<Utc>) -> Detection {
    let emotion = Emotion::from_label_lossy(&raw.label);
    let detection = Detection::new(emotion, f64::from(raw.confidence), timestamp);

    if raw.scores.is_empty() {
        return detection;
    }
    let mut scores = EmotionScores::default();
    for (label, score) in &raw.scores {
        if let Some(e) = Emotion::from_label(label) {
            scores.add(e, clamp_unit(f64::from(*score)));
        }
    }
    detection.with_scores(scores)
}

/// Run inference on one frame. Failures are logged and reported as
/// "no detection", so the caller keeps running on stale state.
pub fn detect_or_skip<A: InferenceAdapter + ?Sized>(
    adapter: &mut A,
    frame: &A::Frame,
    timestamp: DateTime<Utc>,
) -> Option<Detection> {
    match adapter.infer(frame) {
        Ok(Some(raw)) => Some(to_detection(&raw, timestamp)),
        Ok(None) => None,
        Err(e) => {
            warn!("{} failed on this frame, skipping: {e}", adapter.name());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct Scripted(Vec<Result<Option<RawDetection>>>);

    impl InferenceAdapter for Scripted {
        type Frame = ();

        fn infer(&mut self, _frame: &()) -> Result<Option<RawDetection>> {
            self.0.remove(0)
        }

        fn name(&self) -> &str {
            "Scripted"
        }
    }

    fn raw(label: &str, confidence: f32) -> RawDetection {
        RawDetection {
            label: label.to_string(),
            confidence,
            scores: Vec::new(),
        }
    }

    #[test]
    fn test_unknown_label_maps_to_neutral() {
        let detection = to_detection(&raw("contempt", 0.9), Utc::now());
        assert_eq!(detection.emotion, Emotion::Neutral);
        assert!((detection.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(to_detection(&raw("happy", 7.0), Utc::now()).confidence, 1.0);
        assert_eq!(to_detection(&raw("happy", f32::NAN), Utc::now()).confidence, 0.0);
    }

    #[test]
    fn test_scores_are_mapped_by_label() {
        let mut input = raw("happiness", 0.7);
        input.scores = vec![
            ("neutral".to_string(), 0.1),
            ("happiness".to_string(), 0.7),
            ("contempt".to_string(), 0.2),
        ];
        let detection = to_detection(&input, Utc::now());
        let scores = detection.scores.unwrap();
        assert!((scores.get(Emotion::Happy) - 0.7).abs() < 1e-6);
        assert!((scores.get(Emotion::Neutral) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_errors_become_no_detection() {
        let mut adapter = Scripted(vec![
            Err(Error::ModelOutputError("bad tensor".to_string())),
            Ok(None),
            Ok(Some(raw("sad", 0.5))),
        ]);
        assert!(detect_or_skip(&mut adapter, &(), Utc::now()).is_none());
        assert!(detect_or_skip(&mut adapter, &(), Utc::now()).is_none());
        let detection = detect_or_skip(&mut adapter, &(), Utc::now()).unwrap();
        assert_eq!(detection.emotion, Emotion::Sad);
    }
}
