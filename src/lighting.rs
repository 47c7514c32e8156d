//! Emotion to light color mapping with smooth transitions.
//!
//! The mapper owns the lighting state: displayed color, brightness, power
//! flag and the optional calibration override. Every update moves the
//! displayed color a fraction of the way toward the target, so a change of
//! emotion, brightness or power fades instead of cutting.

use crate::{
    color::{channel_from_f64, ColorRgb, ColorTable},
    constants::{DEFAULT_BRIGHTNESS, DEFAULT_MAX_CHANNEL_STEP, DEFAULT_SNAP_THRESHOLD, DEFAULT_TRANSITION_ALPHA},
    emotion::{clamp_unit, Emotion},
};
use log::{debug, info, warn};
use std::time::Duration;

/// How the displayed color approaches its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionConfig {
    /// Fraction of the remaining distance covered per update, in (0, 1]
    pub alpha: f64,
    /// Largest change of a single channel per update
    pub max_step: f64,
    /// Distance (per channel) under which the color snaps onto the target
    pub snap_threshold: f64,
    /// When set, the per-update fraction is `1 - exp(-dt / tau)` instead of `alpha`
    pub time_constant: Option<Duration>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_TRANSITION_ALPHA,
            max_step: DEFAULT_MAX_CHANNEL_STEP,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            time_constant: None,
        }
    }
}

impl TransitionConfig {
    /// Transition that reaches the target on the first update
    #[must_use]
    pub fn instant() -> Self {
        Self {
            alpha: 1.0,
            max_step: 255.0,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            time_constant: None,
        }
    }

    /// Fraction of the remaining distance to cover after `elapsed`
    #[must_use]
    pub fn step_fraction(&self, elapsed: Duration) -> f64 {
        match self.time_constant {
            Some(tau) if tau.is_zero() => 1.0,
            Some(tau) => 1.0 - (-elapsed.as_secs_f64() / tau.as_secs_f64()).exp(),
            None => self.alpha,
        }
    }
}

/// Read-only view of the lighting state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingSnapshot {
    pub color: ColorRgb,
    pub target: ColorRgb,
    pub brightness: f64,
    pub is_on: bool,
    /// Emotion currently driving the target (calibration wins over detection)
    pub emotion: Emotion,
    pub calibration: Option<Emotion>,
}

/// Converts the smoothed emotion into the displayed light color
pub struct LightingMapper {
    table: ColorTable,
    transition: TransitionConfig,
    /// Displayed color at sub-integer precision so fades converge exactly
    current: [f64; 3],
    emotion: Emotion,
    brightness: f64,
    is_on: bool,
    calibration: Option<Emotion>,
}

impl LightingMapper {
    /// Create a mapper that starts switched off, showing black
    pub fn new(table: ColorTable, transition: TransitionConfig) -> Self {
        assert!(
            transition.alpha > 0.0 && transition.alpha <= 1.0,
            "Alpha must be in (0, 1]"
        );
        assert!(transition.max_step > 0.0, "Max step must be positive");
        Self {
            table,
            transition,
            current: [0.0; 3],
            emotion: Emotion::Neutral,
            brightness: DEFAULT_BRIGHTNESS,
            is_on: false,
            calibration: None,
        }
    }

    #[must_use]
    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.set_brightness(brightness);
        self
    }

    #[must_use]
    pub fn with_power(mut self, is_on: bool) -> Self {
        self.is_on = is_on;
        self
    }

    pub fn turn_on(&mut self) {
        if !self.is_on {
            info!("Lights on");
        }
        self.is_on = true;
    }

    pub fn turn_off(&mut self) {
        if self.is_on {
            info!("Lights off");
        }
        self.is_on = false;
    }

    pub fn toggle(&mut self) {
        if self.is_on {
            self.turn_off();
        } else {
            self.turn_on();
        }
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Set brightness, clamped to [0, 1]. Non-finite values are ignored.
    pub fn set_brightness(&mut self, brightness: f64) {
        if !brightness.is_finite() {
            warn!("Ignoring non-finite brightness {brightness}");
            return;
        }
        self.brightness = clamp_unit(brightness);
        debug!("Brightness set to {:.2}", self.brightness);
    }

    /// Set brightness from a percentage (0 to 100)
    pub fn set_brightness_percent(&mut self, percent: f64) {
        self.set_brightness(percent / 100.0);
    }

    pub fn adjust_brightness(&mut self, delta: f64) {
        self.set_brightness(self.brightness + delta);
    }

    #[must_use]
    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Enter (`Some`) or leave (`None`) calibration mode
    pub fn set_calibration(&mut self, emotion: Option<Emotion>) {
        match emotion {
            Some(e) => info!("Calibration mode: previewing {e}"),
            None if self.calibration.is_some() => info!("Calibration mode off"),
            None => {}
        }
        self.calibration = emotion;
    }

    #[must_use]
    pub fn calibration(&self) -> Option<Emotion> {
        self.calibration
    }

    #[must_use]
    pub fn color_table(&self) -> &ColorTable {
        &self.table
    }

    pub fn set_color_table(&mut self, table: ColorTable) {
        self.table = table;
    }

    /// Emotion that currently determines the target color
    #[must_use]
    pub fn effective_emotion(&self) -> Emotion {
        self.calibration.unwrap_or(self.emotion)
    }

    /// Color the display is heading toward.
    ///
    /// Off means black unless calibration is active; calibration previews its
    /// emotion regardless of the power flag.
    #[must_use]
    pub fn target_color(&self) -> ColorRgb {
        if !self.is_on && self.calibration.is_none() {
            return ColorRgb::BLACK;
        }
        self.table.get(self.effective_emotion()).scaled(self.brightness)
    }

    #[must_use]
    pub fn current_color(&self) -> ColorRgb {
        let [r, g, b] = self.current.map(channel_from_f64);
        ColorRgb::new(r, g, b)
    }

    /// Advance one cycle. `emotion` is the smoothed emotion for this cycle,
    /// or `None` to keep the previous one.
    pub fn update(&mut self, emotion: Option<Emotion>, elapsed: Duration) -> ColorRgb {
        if let Some(e) = emotion {
            self.emotion = e;
        }

        let target = self.target_color().channels().map(f64::from);
        let fraction = self.transition.step_fraction(elapsed).clamp(0.0, 1.0);
        let max_step = self.transition.max_step;

        for (channel, goal) in self.current.iter_mut().zip(target) {
            let delta = ((goal - *channel) * fraction).clamp(-max_step, max_step);
            *channel = (*channel + delta).clamp(0.0, 255.0);
        }

        let settled = self
            .current
            .iter()
            .zip(target)
            .all(|(channel, goal)| (goal - channel).abs() <= self.transition.snap_threshold);
        if settled {
            self.current = target;
        }

        self.current_color()
    }

    /// Jump straight to the target color
    pub fn settle(&mut self) -> ColorRgb {
        self.current = self.target_color().channels().map(f64::from);
        self.current_color()
    }

    /// Whether the displayed color has reached the target
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.current_color() == self.target_color()
    }

    #[must_use]
    pub fn snapshot(&self) -> LightingSnapshot {
        LightingSnapshot {
            color: self.current_color(),
            target: self.target_color(),
            brightness: self.brightness,
            is_on: self.is_on,
            emotion: self.effective_emotion(),
            calibration: self.calibration,
        }
    }
}

impl Default for LightingMapper {
    fn default() -> Self {
        Self::new(ColorTable::default(), TransitionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(66);

    fn run(mapper: &mut LightingMapper, emotion: Option<Emotion>, cycles: usize) -> ColorRgb {
        let mut color = mapper.current_color();
        for _ in 0..cycles {
            color = mapper.update(emotion, FRAME);
        }
        color
    }

    #[test]
    fn test_starts_off_and_black() {
        let mapper = LightingMapper::default();
        assert!(!mapper.is_on());
        assert_eq!(mapper.current_color(), ColorRgb::BLACK);
        assert_eq!(mapper.target_color(), ColorRgb::BLACK);
    }

    #[test]
    fn test_happy_full_brightness_converges() {
        let mut mapper = LightingMapper::default().with_brightness(1.0).with_power(true);
        let color = run(&mut mapper, Some(Emotion::Happy), 100);
        assert_eq!(color, ColorRgb::new(255, 200, 0));
        assert!(mapper.is_settled());
    }

    #[test]
    fn test_step_is_bounded() {
        let mut mapper = LightingMapper::new(
            ColorTable::default(),
            TransitionConfig {
                alpha: 1.0,
                max_step: 10.0,
                ..TransitionConfig::default()
            },
        )
        .with_brightness(1.0)
        .with_power(true);

        let first = mapper.update(Some(Emotion::Surprise), FRAME);
        assert_eq!(first, ColorRgb::new(10, 10, 10));
    }

    #[test]
    fn test_off_fades_rather_than_cuts() {
        let mut mapper = LightingMapper::default().with_brightness(1.0).with_power(true);
        run(&mut mapper, Some(Emotion::Neutral), 100);
        mapper.turn_off();

        let after_one = mapper.update(None, FRAME);
        assert_ne!(after_one, ColorRgb::BLACK);
        assert!(after_one.r < 200);

        assert_eq!(run(&mut mapper, None, 100), ColorRgb::BLACK);
    }

    #[test]
    fn test_calibration_overrides_detection_and_power() {
        let mut mapper = LightingMapper::default().with_brightness(0.5);
        mapper.set_calibration(Some(Emotion::Fear));
        let color = run(&mut mapper, Some(Emotion::Happy), 100);
        assert_eq!(color, ColorRgb::new(75, 50, 100));
        assert_eq!(mapper.effective_emotion(), Emotion::Fear);

        mapper.set_calibration(None);
        assert_eq!(mapper.target_color(), ColorRgb::BLACK);
    }

    #[test]
    fn test_brightness_is_clamped() {
        let mut mapper = LightingMapper::default();
        mapper.set_brightness(3.0);
        assert_eq!(mapper.brightness(), 1.0);
        mapper.set_brightness(-1.0);
        assert_eq!(mapper.brightness(), 0.0);
        mapper.set_brightness(f64::NAN);
        assert_eq!(mapper.brightness(), 0.0);
        mapper.set_brightness_percent(40.0);
        assert!((mapper.brightness() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_time_constant_fraction() {
        let transition = TransitionConfig {
            time_constant: Some(Duration::from_millis(100)),
            ..TransitionConfig::default()
        };
        let fraction = transition.step_fraction(Duration::from_millis(100));
        assert!((fraction - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert_eq!(transition.step_fraction(Duration::ZERO), 0.0);
    }

    #[test]
    #[should_panic(expected = "Alpha must be in (0, 1]")]
    fn test_zero_alpha_rejected() {
        let _ = LightingMapper::new(
            ColorTable::default(),
            TransitionConfig {
                alpha: 0.0,
                ..TransitionConfig::default()
            },
        );
    }
}
