//! Configuration management for the mood lighting application

use crate::{
    color::{ColorRgb, ColorTable},
    constants::{
        DEFAULT_BRIGHTNESS, DEFAULT_MAX_CHANNEL_STEP, DEFAULT_SMOOTHING_WINDOW, DEFAULT_SNAP_THRESHOLD,
        DEFAULT_TARGET_FPS, DEFAULT_TRANSITION_ALPHA, EMOTION_INPUT_SIZE, MIN_FACE_SIZE, MIN_PANEL_HEIGHT,
        MIN_PANEL_WIDTH,
    },
    emotion::Emotion,
    emotion_detection::{CascadeParams, FERPLUS_LABELS},
    lighting::{LightingMapper, TransitionConfig},
    session_log::SessionLogger,
    smoothing::{create_smoother, validate_window_size, EmotionSmoother},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// Capture configuration
    pub camera: CameraConfig,

    /// Emotion smoothing configuration
    pub smoothing: SmoothingConfig,

    /// Light behaviour
    pub lighting: LightingConfig,

    /// Per-emotion color overrides; emotions not listed keep their default
    pub colors: BTreeMap<Emotion, ColorRgb>,

    /// Session log configuration
    pub session_log: SessionLogConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX emotion classifier
    pub emotion_model: PathBuf,

    /// Path to the OpenCV Haar cascade used to find faces
    pub face_cascade: PathBuf,

    /// Model output labels, in output order
    pub labels: Vec<String>,

    /// Side length of the square model input
    pub input_size: i32,

    /// Multiplier applied to 0..255 pixel values before inference
    pub pixel_scale: f64,
}

/// Face detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Cascade pyramid scale step (> 1.0)
    pub scale_factor: f64,

    /// Neighbouring detections required to keep a face
    pub min_neighbors: i32,

    /// Smallest face side in pixels
    pub min_face_size: i32,
}

/// Capture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Webcam index
    pub index: i32,

    /// Play a video file instead of the webcam
    pub video_file: Option<String>,

    /// Mirror frames horizontally
    pub mirror: bool,
}

/// Smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// `majority`, `weighted` or `none`
    pub method: String,

    /// Number of recent detections considered
    pub window_size: usize,
}

/// Light parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Switch the light on at startup
    pub start_on: bool,

    /// Initial brightness (0.0-1.0)
    pub brightness: f64,

    /// Fraction of the remaining distance covered per cycle (0.0-1.0]
    pub transition_alpha: f64,

    /// Largest per-channel change per cycle
    pub max_step: f64,

    /// Channel distance under which the color snaps to its target
    pub snap_threshold: f64,

    /// Time constant in milliseconds; overrides `transition_alpha` when set
    pub transition_time_ms: Option<u64>,
}

/// Session log parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLogConfig {
    /// Append emotion changes to this JSON-lines file
    pub path: Option<PathBuf>,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Refresh rate of the lighting loop
    pub target_fps: u32,

    /// `all`, `panel`, `cam` or `none`
    pub gui_mode: String,

    /// Panel window width
    pub window_width: i32,

    /// Panel window height
    pub window_height: i32,

    /// Show per-emotion probabilities in the panel
    pub show_scores: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            emotion_model: PathBuf::from("assets/emotion-ferplus-8.onnx"),
            face_cascade: PathBuf::from("assets/haarcascade_frontalface_default.xml"),
            labels: FERPLUS_LABELS.iter().map(|l| (*l).to_string()).collect(),
            input_size: EMOTION_INPUT_SIZE,
            pixel_scale: 1.0,
        }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        let params = CascadeParams::default();
        Self {
            scale_factor: params.scale_factor,
            min_neighbors: params.min_neighbors,
            min_face_size: MIN_FACE_SIZE,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            video_file: None,
            mirror: true,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            method: "majority".to_string(),
            window_size: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            start_on: false,
            brightness: DEFAULT_BRIGHTNESS,
            transition_alpha: DEFAULT_TRANSITION_ALPHA,
            max_step: DEFAULT_MAX_CHANNEL_STEP,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            transition_time_ms: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            gui_mode: "all".to_string(),
            window_width: 420,
            window_height: 480,
            show_scores: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Smoother spec string understood by [`create_smoother`]
    #[must_use]
    pub fn smoother_spec(&self) -> String {
        match self.smoothing.method.trim().to_lowercase().as_str() {
            "none" | "latest" | "passthrough" => self.smoothing.method.clone(),
            _ => format!("{}:{}", self.smoothing.method, self.smoothing.window_size),
        }
    }

    /// Create the configured smoother
    pub fn create_smoother(&self) -> Result<Box<dyn EmotionSmoother>> {
        create_smoother(&self.smoother_spec())
    }

    /// Default color table with the configured overrides applied
    #[must_use]
    pub fn color_table(&self) -> ColorTable {
        ColorTable::with_overrides(&self.colors)
    }

    #[must_use]
    pub fn transition(&self) -> TransitionConfig {
        TransitionConfig {
            alpha: self.lighting.transition_alpha,
            max_step: self.lighting.max_step,
            snap_threshold: self.lighting.snap_threshold,
            time_constant: self.lighting.transition_time_ms.map(Duration::from_millis),
        }
    }

    /// Create the lighting mapper in its startup state
    #[must_use]
    pub fn create_mapper(&self) -> LightingMapper {
        LightingMapper::new(self.color_table(), self.transition())
            .with_brightness(self.lighting.brightness)
            .with_power(self.lighting.start_on)
    }

    /// Create the session logger, mirrored to a file when configured
    pub fn create_logger(&self) -> Result<SessionLogger> {
        match &self.session_log.path {
            Some(path) => SessionLogger::with_file(path),
            None => Ok(SessionLogger::new()),
        }
    }

    #[must_use]
    pub fn cascade_params(&self) -> CascadeParams {
        CascadeParams {
            scale_factor: self.face_detection.scale_factor,
            min_neighbors: self.face_detection.min_neighbors,
            min_face_size: self.face_detection.min_face_size,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate smoothing
        validate_window_size(self.smoothing.window_size).map_err(|e| Error::ConfigError(e.to_string()))?;
        create_smoother(&self.smoother_spec()).map_err(|e| Error::ConfigError(e.to_string()))?;

        // Validate lighting
        if !(0.0..=1.0).contains(&self.lighting.brightness) {
            return Err(Error::ConfigError("Brightness must be between 0.0 and 1.0".to_string()));
        }
        if !(self.lighting.transition_alpha > 0.0 && self.lighting.transition_alpha <= 1.0) {
            return Err(Error::ConfigError("Transition alpha must be in (0.0, 1.0]".to_string()));
        }
        if self.lighting.max_step <= 0.0 || !self.lighting.max_step.is_finite() {
            return Err(Error::ConfigError("Max step must be a positive number".to_string()));
        }
        if self.lighting.snap_threshold < 0.0 {
            return Err(Error::ConfigError("Snap threshold must not be negative".to_string()));
        }

        // Validate model parameters
        if self.models.labels.is_empty() {
            return Err(Error::ConfigError("Model label list must not be empty".to_string()));
        }
        if self.models.input_size <= 0 {
            return Err(Error::ConfigError("Model input size must be positive".to_string()));
        }
        if self.face_detection.scale_factor <= 1.0 {
            return Err(Error::ConfigError("Cascade scale factor must be greater than 1.0".to_string()));
        }

        // Validate display settings
        if self.display.target_fps == 0 {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }

        if self.display.window_width < MIN_PANEL_WIDTH || self.display.window_height < MIN_PANEL_HEIGHT {
            return Err(Error::ConfigError(format!(
                "Window size must be at least {MIN_PANEL_WIDTH}x{MIN_PANEL_HEIGHT}, got {}x{}",
                self.display.window_width, self.display.window_height
            )));
        }

        Ok(())
    }

    /// Check that the model files exist
    pub fn check_model_files(&self) -> Result<()> {
        if !self.models.emotion_model.exists() {
            return Err(Error::ConfigError(format!(
                "Emotion model not found: {}",
                self.models.emotion_model.display()
            )));
        }
        if !self.models.face_cascade.exists() {
            return Err(Error::ConfigError(format!(
                "Face cascade not found: {}",
                self.models.face_cascade.display()
            )));
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Mood Lighting Configuration

# Model paths
models:
  emotion_model: "assets/emotion-ferplus-8.onnx"
  face_cascade: "assets/haarcascade_frontalface_default.xml"
  labels: [neutral, happiness, surprise, sadness, anger, disgust, fear, contempt]
  input_size: 64
  pixel_scale: 1.0

# Face detection parameters
face_detection:
  scale_factor: 1.1
  min_neighbors: 5
  min_face_size: 48

# Capture
camera:
  index: 0
  mirror: true

# Smoothing: majority, weighted or none
smoothing:
  method: "majority"
  window_size: 10

# Light behaviour
lighting:
  start_on: false
  brightness: 0.7
  transition_alpha: 0.25
  max_step: 48.0
  snap_threshold: 0.5

# Color overrides (RGB); unlisted emotions keep their defaults
colors:
  happy: [255, 200, 0]
  sad: [100, 150, 255]

# Session log (JSON lines)
session_log:
  path: null

# Display settings
display:
  target_fps: 15
  gui_mode: "all"
  window_width: 420
  window_height: 480
  show_scores: true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.smoothing.window_size, 10);
        assert_eq!(config.colors.get(&Emotion::Happy), Some(&ColorRgb::new(255, 200, 0)));
        assert_eq!(config.models.labels.len(), 8);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("smoothing:\n  window_size: 3\n").unwrap();
        assert_eq!(config.smoothing.window_size, 3);
        assert_eq!(config.smoothing.method, "majority");
        assert_eq!(config.display.target_fps, DEFAULT_TARGET_FPS);
    }

    #[test]
    fn test_smoother_spec() {
        let mut config = Config::default();
        assert_eq!(config.smoother_spec(), "majority:10");
        config.smoothing.method = "none".to_string();
        assert_eq!(config.smoother_spec(), "none");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.lighting.brightness = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.smoothing.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.lighting.transition_alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.smoothing.method = "kalman".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.target_fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_size_validation() {
        let mut config = Config::default();
        config.display.window_width = 19;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.window_height = -5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.window_width = MIN_PANEL_WIDTH;
        config.display.window_height = MIN_PANEL_HEIGHT;
        assert!(config.validate().is_ok());
    }
}
