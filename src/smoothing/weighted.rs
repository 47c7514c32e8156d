use super::{validate_window_size, window::DetectionWindow, EmotionSmoother, SmoothedEmotion};
use crate::{
    emotion::{Detection, EmotionScores},
    Result,
};

/// Averages the classifier's score vectors over the window and reports the
/// highest average. Detections without a score vector contribute their
/// confidence to their own emotion only.
pub struct ConfidenceWeightedSmoother {
    window: DetectionWindow,
}

impl ConfidenceWeightedSmoother {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: DetectionWindow::new(window_size),
        }
    }

    /// Mean score vector over the window
    pub fn average_scores(&self) -> EmotionScores {
        let mut total = EmotionScores::default();
        for detection in self.window.iter() {
            let scores = detection
                .scores
                .unwrap_or_else(|| EmotionScores::one_hot(detection.emotion, detection.confidence));
            total.accumulate(&scores);
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.window.len() as f64;
        total.scale_down(count);
        total
    }

    fn average(&self) -> SmoothedEmotion {
        if self.window.is_empty() {
            return SmoothedEmotion::EMPTY;
        }
        let (emotion, confidence) = self.average_scores().dominant();
        if confidence <= 0.0 {
            // Nothing carries weight; keep the latest observed emotion
            return self.window.iter().next_back().map_or(SmoothedEmotion::EMPTY, |latest| SmoothedEmotion {
                emotion: latest.emotion,
                confidence: 0.0,
            });
        }
        SmoothedEmotion {
            emotion,
            confidence: crate::emotion::clamp_unit(confidence),
        }
    }
}

impl EmotionSmoother for ConfidenceWeightedSmoother {
    fn push(&mut self, detection: &Detection) -> SmoothedEmotion {
        self.window.push(detection.clone());
        self.average()
    }

    fn current(&self) -> SmoothedEmotion {
        self.average()
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        validate_window_size(window_size)?;
        self.window.resize(window_size);
        Ok(())
    }

    fn window_size(&self) -> usize {
        self.window.capacity()
    }

    fn len(&self) -> usize {
        self.window.len()
    }

    fn name(&self) -> &str {
        "ConfidenceWeightedSmoother"
    }
}
