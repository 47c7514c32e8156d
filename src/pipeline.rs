//! One refresh cycle: detection → smoother → lighting mapper → session log.
//!
//! [`Pipeline`] is the single owner of all mutable lighting state. The
//! application loop passes it `&mut` into every cycle, so detections are
//! always applied in capture order from one place.

use crate::{
    color::ColorRgb,
    config::Config,
    constants::MAX_SMOOTHING_WINDOW,
    emotion::{Detection, Emotion, EmotionScores},
    lighting::{LightingMapper, LightingSnapshot},
    session_log::SessionLogger,
    smoothing::{EmotionSmoother, SmoothedEmotion},
    Result,
};
use log::{info, warn};
use std::time::Duration;

/// User control forwarded by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlInput {
    TurnOn,
    TurnOff,
    Toggle,
    /// Absolute brightness, clamped to [0, 1]
    SetBrightness(f64),
    /// Relative brightness change
    AdjustBrightness(f64),
    /// Enter calibration with an emotion, or leave it with `None`
    Calibrate(Option<Emotion>),
    SetWindowSize(usize),
    AdjustWindowSize(i64),
    ClearLog,
    Quit,
}

/// Everything the presentation layer needs about one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutput {
    /// Color to display this cycle
    pub color: ColorRgb,
    pub smoothed: SmoothedEmotion,
    /// Detection consumed this cycle, if any
    pub detection: Option<Detection>,
    /// Whether the session log grew this cycle
    pub logged: bool,
    pub lighting: LightingSnapshot,
}

/// Explicit state for the capture → light loop
pub struct Pipeline {
    smoother: Box<dyn EmotionSmoother>,
    mapper: LightingMapper,
    logger: SessionLogger,
    smoothed: SmoothedEmotion,
    latest_scores: Option<EmotionScores>,
}

impl Pipeline {
    pub fn new(smoother: Box<dyn EmotionSmoother>, mapper: LightingMapper, logger: SessionLogger) -> Self {
        Self {
            smoother,
            mapper,
            logger,
            smoothed: SmoothedEmotion::EMPTY,
            latest_scores: None,
        }
    }

    /// Build smoother, mapper and logger from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let smoother = config.create_smoother()?;
        let mapper = config.create_mapper();
        let logger = config.create_logger()?;
        info!(
            "Pipeline ready: {} (window {}), brightness {:.0}%",
            smoother.name(),
            smoother.window_size(),
            mapper.brightness() * 100.0
        );
        Ok(Self::new(smoother, mapper, logger))
    }

    /// Run one cycle.
    ///
    /// `detection` is `None` when the frame had no face or inference failed;
    /// the smoother then keeps its window and the light keeps fading toward
    /// the previous target. In calibration mode detections are not fed to
    /// the smoother or the log.
    pub fn process(&mut self, detection: Option<Detection>, elapsed: Duration) -> CycleOutput {
        let mut logged = false;
        let mut emotion = None;

        if let Some(d) = &detection {
            if let Some(scores) = d.scores {
                self.latest_scores = Some(scores);
            }
            if self.mapper.calibration().is_none() {
                self.smoothed = self.smoother.push(d);
                emotion = Some(self.smoothed.emotion);
                logged = self.logger.record(self.smoothed.emotion, d.timestamp);
            }
        }

        let color = self.mapper.update(emotion, elapsed);

        CycleOutput {
            color,
            smoothed: self.smoothed,
            detection,
            logged,
            lighting: self.mapper.snapshot(),
        }
    }

    /// Apply a user control. Returns `false` when the loop should stop.
    pub fn apply(&mut self, control: ControlInput) -> bool {
        match control {
            ControlInput::TurnOn => self.mapper.turn_on(),
            ControlInput::TurnOff => self.mapper.turn_off(),
            ControlInput::Toggle => self.mapper.toggle(),
            ControlInput::SetBrightness(b) => self.mapper.set_brightness(b),
            ControlInput::AdjustBrightness(delta) => self.mapper.adjust_brightness(delta),
            ControlInput::Calibrate(emotion) => self.mapper.set_calibration(emotion),
            ControlInput::SetWindowSize(size) => self.resize_window(size),
            ControlInput::AdjustWindowSize(delta) => {
                #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let size = (self.smoother.window_size() as i64 + delta).clamp(1, MAX_SMOOTHING_WINDOW as i64) as usize;
                self.resize_window(size);
            }
            ControlInput::ClearLog => {
                info!("Session log cleared ({} entries)", self.logger.len());
                self.logger.clear();
            }
            ControlInput::Quit => return false,
        }
        true
    }

    fn resize_window(&mut self, size: usize) {
        match self.smoother.set_window_size(size) {
            Ok(()) => info!("Smoothing window set to {}", self.smoother.window_size()),
            Err(e) => warn!("Ignoring window size change: {e}"),
        }
    }

    #[must_use]
    pub fn smoothed(&self) -> SmoothedEmotion {
        self.smoothed
    }

    /// Score vector of the most recent detection that carried one
    #[must_use]
    pub fn latest_scores(&self) -> Option<&EmotionScores> {
        self.latest_scores.as_ref()
    }

    #[must_use]
    pub fn lighting(&self) -> LightingSnapshot {
        self.mapper.snapshot()
    }

    #[must_use]
    pub fn mapper(&self) -> &LightingMapper {
        &self.mapper
    }

    #[must_use]
    pub fn smoother(&self) -> &dyn EmotionSmoother {
        self.smoother.as_ref()
    }

    #[must_use]
    pub fn session_log(&self) -> &SessionLogger {
        &self.logger
    }
}
