//! Error handling tests for all modules

use mood_lighting::{
    capture::{Camera, VideoSource},
    color::ColorRgb,
    config::Config,
    emotion::Emotion,
    error::AppError,
    inference::{to_detection, RawDetection},
    lighting::LightingMapper,
    presentation::GuiMode,
    smoothing::create_smoother,
};
use chrono::Utc;

#[test]
fn test_smoother_creation_errors() {
    // Test invalid smoother type
    let result = create_smoother("kalman");
    assert!(result.is_err());

    // Test invalid window size
    let result = create_smoother("majority:0");
    match result {
        Err(AppError::SmoothingError(msg)) => assert!(msg.contains("Window size")),
        _ => panic!("Expected SmoothingError"),
    }

    // Test window size above the limit
    assert!(create_smoother("weighted:1000").is_err());

    // Test non-numeric window size
    match create_smoother("weighted:abc") {
        Err(AppError::SmoothingError(msg)) => assert!(msg.contains("positive integer")),
        _ => panic!("Expected SmoothingError"),
    }

    // Test pass-through (should always succeed)
    assert!(create_smoother("none").is_ok());
}

#[test]
fn test_invalid_brightness_is_clamped() {
    let mut mapper = LightingMapper::default();
    mapper.set_brightness(-0.5);
    assert_eq!(mapper.brightness(), 0.0);
    mapper.set_brightness(4.0);
    assert_eq!(mapper.brightness(), 1.0);
    mapper.set_brightness(f64::NAN);
    assert_eq!(mapper.brightness(), 1.0);
    mapper.set_brightness_percent(50.0);
    assert!((mapper.brightness() - 0.5).abs() < 1e-9);
}

#[test]
fn test_unknown_labels_map_to_neutral() {
    for label in ["contempt", "", "HAPPY!", "unknown"] {
        let raw = RawDetection {
            label: label.to_string(),
            confidence: 0.6,
            scores: Vec::new(),
        };
        assert_eq!(to_detection(&raw, Utc::now()).emotion, Emotion::Neutral, "{label}");
    }
    assert_eq!("Happiness".parse::<Emotion>().unwrap(), Emotion::Happy);
    assert!("contempt".parse::<Emotion>().is_err());
}

#[test]
fn test_scaling_never_leaves_channel_range() {
    let white = ColorRgb::new(255, 255, 255);
    assert_eq!(white.scaled(2.0), white);
    assert_eq!(white.scaled(-1.0), ColorRgb::BLACK);
    assert_eq!(white.scaled(f64::NAN), ColorRgb::BLACK);
}

#[test]
fn test_config_validation_errors() {
    let mut config = Config::default();
    config.lighting.max_step = 0.0;
    assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

    let mut config = Config::default();
    config.smoothing.window_size = 500;
    assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

    let mut config = Config::default();
    config.models.labels.clear();
    assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

    let mut config = Config::default();
    config.display.window_width = 10;
    match config.validate() {
        Err(AppError::ConfigError(msg)) => assert!(msg.contains("Window size")),
        _ => panic!("Expected ConfigError"),
    }
}

#[test]
fn test_invalid_gui_mode() {
    match "pointers".parse::<GuiMode>() {
        Err(AppError::InvalidInput(msg)) => assert!(msg.contains("pointers")),
        _ => panic!("Expected InvalidInput"),
    }
}

#[test]
fn test_missing_video_file() {
    let result = Camera::open(VideoSource::File("/nonexistent/video.mp4".to_string()), false);
    assert!(result.is_err());
}
