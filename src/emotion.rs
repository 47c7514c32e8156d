//! Emotion labels and per-frame detections.

use crate::{constants::NUM_EMOTIONS, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One label from the closed set of recognised emotions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    #[default]
    Neutral,
}

impl Emotion {
    /// All emotions, in table order. Key bindings `1`..`7` follow this order.
    pub const ALL: [Emotion; NUM_EMOTIONS] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprise,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Neutral,
    ];

    /// Lowercase label used in logs and configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprise => "surprise",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
        }
    }

    /// Position of this emotion in [`Emotion::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse a model or user label. Accepts the aliases emitted by common
    /// emotion models (`happiness`, `sadness`, `anger`, `surprised`).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "happy" | "happiness" => Some(Emotion::Happy),
            "sad" | "sadness" => Some(Emotion::Sad),
            "angry" | "anger" => Some(Emotion::Angry),
            "surprise" | "surprised" => Some(Emotion::Surprise),
            "fear" | "fearful" => Some(Emotion::Fear),
            "disgust" | "disgusted" => Some(Emotion::Disgust),
            "neutral" => Some(Emotion::Neutral),
            _ => None,
        }
    }

    /// Parse a label, falling back to [`Emotion::Neutral`] for anything unknown
    #[must_use]
    pub fn from_label_lossy(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| {
            log::debug!("Unrecognised emotion label '{label}', treating as neutral");
            Emotion::Neutral
        })
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s).ok_or_else(|| Error::InvalidInput(format!("Unknown emotion: {s}")))
    }
}

/// Per-emotion probabilities for a single frame, indexed like [`Emotion::ALL`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmotionScores([f64; NUM_EMOTIONS]);

impl EmotionScores {
    #[must_use]
    pub const fn new(values: [f64; NUM_EMOTIONS]) -> Self {
        Self(values)
    }

    /// Scores with `weight` on a single emotion and zero elsewhere
    #[must_use]
    pub fn one_hot(emotion: Emotion, weight: f64) -> Self {
        let mut values = [0.0; NUM_EMOTIONS];
        values[emotion.index()] = weight;
        Self(values)
    }

    #[must_use]
    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0[emotion.index()]
    }

    pub fn add(&mut self, emotion: Emotion, value: f64) {
        self.0[emotion.index()] += value;
    }

    /// Component-wise sum
    pub fn accumulate(&mut self, other: &EmotionScores) {
        for (acc, value) in self.0.iter_mut().zip(other.0.iter()) {
            *acc += value;
        }
    }

    /// Divide every score by `divisor`; a zero divisor leaves the scores untouched
    pub fn scale_down(&mut self, divisor: f64) {
        if divisor > 0.0 {
            for value in &mut self.0 {
                *value /= divisor;
            }
        }
    }

    /// Highest-scoring emotion and its score. Ties resolve to the earlier table entry.
    #[must_use]
    pub fn dominant(&self) -> (Emotion, f64) {
        Emotion::ALL
            .iter()
            .map(|&e| (e, self.get(e)))
            .fold((Emotion::Neutral, f64::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }

    /// Emotions sorted by descending score
    #[must_use]
    pub fn ranked(&self) -> Vec<(Emotion, f64)> {
        let mut ranked: Vec<(Emotion, f64)> = Emotion::ALL.iter().map(|&e| (e, self.get(e))).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// A single frame's classification result
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub emotion: Emotion,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// Full score vector when the classifier provides one
    pub scores: Option<EmotionScores>,
}

impl Detection {
    /// Build a detection, clamping confidence into [0, 1] (NaN becomes 0)
    #[must_use]
    pub fn new(emotion: Emotion, confidence: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion,
            confidence: clamp_unit(confidence),
            timestamp,
            scores: None,
        }
    }

    #[must_use]
    pub fn with_scores(mut self, scores: EmotionScores) -> Self {
        self.scores = Some(scores);
        self
    }
}

/// Clamp to [0, 1], mapping NaN to 0
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_label(emotion.as_str()), Some(emotion));
        }
    }

    #[test]
    fn test_model_aliases() {
        assert_eq!(Emotion::from_label("Happiness"), Some(Emotion::Happy));
        assert_eq!(Emotion::from_label(" SADNESS "), Some(Emotion::Sad));
        assert_eq!(Emotion::from_label("anger"), Some(Emotion::Angry));
        assert_eq!(Emotion::from_label("surprised"), Some(Emotion::Surprise));
    }

    #[test]
    fn test_unknown_label_is_neutral() {
        assert_eq!(Emotion::from_label("contempt"), None);
        assert_eq!(Emotion::from_label_lossy("contempt"), Emotion::Neutral);
        assert_eq!(Emotion::from_label_lossy(""), Emotion::Neutral);
        assert!("bored".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_index_matches_table_order() {
        for (i, emotion) in Emotion::ALL.iter().enumerate() {
            assert_eq!(emotion.index(), i);
        }
    }

    #[test]
    fn test_detection_clamps_confidence() {
        let now = Utc::now();
        assert_eq!(Detection::new(Emotion::Sad, 1.7, now).confidence, 1.0);
        assert_eq!(Detection::new(Emotion::Sad, -0.2, now).confidence, 0.0);
        assert_eq!(Detection::new(Emotion::Sad, f64::NAN, now).confidence, 0.0);
    }

    #[test]
    fn test_scores_dominant_and_ranked() {
        let mut scores = EmotionScores::default();
        scores.add(Emotion::Fear, 0.6);
        scores.add(Emotion::Sad, 0.3);
        assert_eq!(scores.dominant(), (Emotion::Fear, 0.6));

        let ranked = scores.ranked();
        assert_eq!(ranked[0].0, Emotion::Fear);
        assert_eq!(ranked[1].0, Emotion::Sad);
    }

    #[test]
    fn test_serde_lowercase() {
        let yaml = serde_yaml::to_string(&Emotion::Surprise).unwrap();
        assert_eq!(yaml.trim(), "surprise");
        let parsed: Emotion = serde_yaml::from_str("disgust").unwrap();
        assert_eq!(parsed, Emotion::Disgust);
    }
}
