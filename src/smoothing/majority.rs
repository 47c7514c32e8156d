use super::{validate_window_size, window::DetectionWindow, EmotionSmoother, SmoothedEmotion};
use crate::{
    constants::NUM_EMOTIONS,
    emotion::{Detection, Emotion},
    Result,
};

/// Majority vote over the last `window_size` detections.
///
/// Ties go to the emotion with the larger summed confidence, then to the one
/// seen most recently. The reported confidence is the mean confidence of the
/// winning emotion's samples.
pub struct MajorityVoteSmoother {
    window: DetectionWindow,
}

impl MajorityVoteSmoother {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: DetectionWindow::new(window_size),
        }
    }

    fn vote(&self) -> SmoothedEmotion {
        if self.window.is_empty() {
            return SmoothedEmotion::EMPTY;
        }

        let mut counts = [0usize; NUM_EMOTIONS];
        let mut confidence_sums = [0.0f64; NUM_EMOTIONS];
        for detection in self.window.iter() {
            counts[detection.emotion.index()] += 1;
            confidence_sums[detection.emotion.index()] += detection.confidence;
        }

        let rank = |e: Emotion| (counts[e.index()], confidence_sums[e.index()]);

        // Newest first, so among equal ranks the most recent emotion wins
        let mut winner: Option<Emotion> = None;
        for detection in self.window.iter().rev() {
            let candidate = detection.emotion;
            winner = match winner {
                None => Some(candidate),
                Some(best) => {
                    let (count, sum) = rank(candidate);
                    let (best_count, best_sum) = rank(best);
                    if count > best_count || (count == best_count && sum > best_sum) {
                        Some(candidate)
                    } else {
                        Some(best)
                    }
                }
            };
        }

        let emotion = winner.unwrap_or_default();
        let (count, sum) = rank(emotion);
        #[allow(clippy::cast_precision_loss)] // window sizes are tiny
        let confidence = if count == 0 { 0.0 } else { sum / count as f64 };

        SmoothedEmotion { emotion, confidence }
    }
}

impl EmotionSmoother for MajorityVoteSmoother {
    fn push(&mut self, detection: &Detection) -> SmoothedEmotion {
        self.window.push(detection.clone());
        self.vote()
    }

    fn current(&self) -> SmoothedEmotion {
        self.vote()
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
        "MajorityVoteSmoother"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn detection(emotion: Emotion, confidence: f64) -> Detection {
        Detection::new(emotion, confidence, Utc::now())
    }

    #[test]
    fn test_empty_window_is_neutral() {
        let smoother = MajorityVoteSmoother::new(5);
        assert_eq!(smoother.current(), SmoothedEmotion::EMPTY);
    }

    #[test]
    fn test_majority_wins() {
        let mut smoother = MajorityVoteSmoother::new(5);
        smoother.push(&detection(Emotion::Happy, 0.9));
        smoother.push(&detection(Emotion::Sad, 0.6));
        let out = smoother.push(&detection(Emotion::Happy, 0.7));

        assert_eq!(out.emotion, Emotion::Happy);
        assert!((out.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_single_noisy_frame_is_ignored() {
        let mut smoother = MajorityVoteSmoother::new(5);
        for _ in 0..4 {
            smoother.push(&detection(Emotion::Neutral, 0.8));
        }
        let out = smoother.push(&detection(Emotion::Angry, 0.99));
        assert_eq!(out.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_tie_breaks_on_confidence_then_recency() {
        let mut smoother = MajorityVoteSmoother::new(2);
        smoother.push(&detection(Emotion::Happy, 0.9));
        let out = smoother.push(&detection(Emotion::Sad, 0.4));
        assert_eq!(out.emotion, Emotion::Happy);

        smoother.reset();
        smoother.push(&detection(Emotion::Happy, 0.5));
        let out = smoother.push(&detection(Emotion::Sad, 0.5));
        assert_eq!(out.emotion, Emotion::Sad);
    }
}
