//! RGB colors and the emotion to color lookup table.

use crate::{
    constants::{LIGHT_COLOR_SUM, NUM_EMOTIONS},
    emotion::Emotion,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An 8-bit RGB triple. Serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct ColorRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgb {
    pub const BLACK: ColorRgb = ColorRgb::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Multiply every channel by `factor`, rounding half to even.
    /// The factor is clamped to [0, 1] first.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        let factor = crate::emotion::clamp_unit(factor);
        let [r, g, b] = self.channels().map(|c| channel_from_f64(f64::from(c) * factor));
        Self { r, g, b }
    }

    /// `#rrggbb`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Whether dark text reads better on top of this color
    #[must_use]
    pub fn is_light(self) -> bool {
        self.channels().iter().map(|&c| u32::from(c)).sum::<u32>() > LIGHT_COLOR_SUM
    }
}

impl From<[u8; 3]> for ColorRgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<ColorRgb> for [u8; 3] {
    fn from(color: ColorRgb) -> Self {
        color.channels()
    }
}

impl From<ColorRgb> for (u8, u8, u8) {
    fn from(color: ColorRgb) -> Self {
        (color.r, color.g, color.b)
    }
}

impl fmt::Display for ColorRgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Round half to even and clamp into a channel value. NaN maps to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to [0, 255] first
pub fn channel_from_f64(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Base color for every emotion. Always holds exactly one entry per emotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: [ColorRgb; NUM_EMOTIONS],
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            colors: Emotion::ALL.map(default_color),
        }
    }
}

/// Shipped color for an emotion
#[must_use]
pub const fn default_color(emotion: Emotion) -> ColorRgb {
    match emotion {
        Emotion::Happy => ColorRgb::new(255, 200, 0),      // warm yellow/orange
        Emotion::Sad => ColorRgb::new(100, 150, 255),      // cool blue
        Emotion::Angry => ColorRgb::new(255, 50, 50),      // red
        Emotion::Surprise => ColorRgb::new(255, 255, 100), // bright yellow
        Emotion::Fear => ColorRgb::new(150, 100, 200),     // purple
        Emotion::Disgust => ColorRgb::new(100, 200, 100),  // green
        Emotion::Neutral => ColorRgb::new(200, 200, 200),  // white
    }
}

impl ColorTable {
    /// Default table with the given entries replaced
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<Emotion, ColorRgb>) -> Self {
        let mut table = Self::default();
        for (&emotion, &color) in overrides {
            table.set(emotion, color);
        }
        table
    }

    #[must_use]
    pub fn get(&self, emotion: Emotion) -> ColorRgb {
        self.colors[emotion.index()]
    }

    pub fn set(&mut self, emotion: Emotion, color: ColorRgb) {
        self.colors[emotion.index()] = color;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, ColorRgb)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_entries() {
        let table = ColorTable::default();
        assert_eq!(table.get(Emotion::Happy), ColorRgb::new(255, 200, 0));
        assert_eq!(table.get(Emotion::Fear), ColorRgb::new(150, 100, 200));
        assert_eq!(table.get(Emotion::Neutral), ColorRgb::new(200, 200, 200));
        assert_eq!(table.iter().count(), NUM_EMOTIONS);
    }

    #[test]
    fn test_scaled_rounds_half_to_even() {
        // 255 * 0.5 = 127.5 -> 128, 1 * 0.5 = 0.5 -> 0, 3 * 0.5 = 1.5 -> 2
        assert_eq!(ColorRgb::new(255, 1, 3).scaled(0.5), ColorRgb::new(128, 0, 2));
        assert_eq!(ColorRgb::new(150, 100, 200).scaled(0.5), ColorRgb::new(75, 50, 100));
    }

    #[test]
    fn test_scaled_clamps_factor() {
        let c = ColorRgb::new(10, 20, 30);
        assert_eq!(c.scaled(2.0), c);
        assert_eq!(c.scaled(-1.0), ColorRgb::BLACK);
        assert_eq!(c.scaled(f64::NAN), ColorRgb::BLACK);
    }

    #[test]
    fn test_channel_from_f64() {
        assert_eq!(channel_from_f64(-4.0), 0);
        assert_eq!(channel_from_f64(300.0), 255);
        assert_eq!(channel_from_f64(2.5), 2);
        assert_eq!(channel_from_f64(f64::INFINITY), 255);
    }

    #[test]
    fn test_hex_and_lightness() {
        assert_eq!(ColorRgb::new(255, 200, 0).to_hex(), "#ffc800");
        assert!(ColorRgb::new(200, 200, 200).is_light());
        assert!(!ColorRgb::new(100, 150, 100).is_light());
    }

    #[test]
    fn test_overrides_keep_other_defaults() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Emotion::Sad, ColorRgb::new(0, 0, 128));
        let table = ColorTable::with_overrides(&overrides);
        assert_eq!(table.get(Emotion::Sad), ColorRgb::new(0, 0, 128));
        assert_eq!(table.get(Emotion::Happy), default_color(Emotion::Happy));
    }
}
