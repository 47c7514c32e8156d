//! Configuration files and the objects built from them

use mood_lighting::{
    color::ColorRgb,
    config::{Config, EXAMPLE_CONFIG},
    emotion::Emotion,
    Error,
};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_example_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    let original: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
    original.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.smoothing.method, original.smoothing.method);
    assert_eq!(loaded.smoothing.window_size, original.smoothing.window_size);
    assert_eq!(loaded.colors, original.colors);
    assert_eq!(loaded.models.labels, original.models.labels);
    assert_eq!(loaded.lighting.brightness, original.lighting.brightness);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_color_overrides_reach_the_mapper() {
    let yaml = "colors:\n  neutral: [10, 20, 30]\nlighting:\n  start_on: true\n  brightness: 1.0\n  transition_alpha: 1.0\n  max_step: 255.0\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    let table = config.color_table();
    assert_eq!(table.get(Emotion::Neutral), ColorRgb::new(10, 20, 30));
    assert_eq!(table.get(Emotion::Happy), ColorRgb::new(255, 200, 0));

    let mut mapper = config.create_mapper();
    assert!(mapper.is_on());
    assert_eq!(
        mapper.update(Some(Emotion::Neutral), Duration::from_millis(66)),
        ColorRgb::new(10, 20, 30)
    );
}

#[test]
fn test_transition_time_constant() {
    let config: Config = serde_yaml::from_str("lighting:\n  transition_time_ms: 250\n").unwrap();
    assert_eq!(config.transition().time_constant, Some(Duration::from_millis(250)));
    assert_eq!(Config::default().transition().time_constant, None);
}

#[test]
fn test_unknown_emotion_in_colors_is_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("colors:\n  contempt: [1, 2, 3]\n");
    assert!(result.is_err());
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "smoothing: [not, a, map").unwrap();

    match Config::from_file(&path) {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("Failed to parse config")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_missing_config_file_is_io_error() {
    assert!(matches!(
        Config::from_file("/nonexistent/mood.yaml"),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_created_smoother_matches_config() {
    let mut config = Config::default();
    config.smoothing.method = "weighted".to_string();
    config.smoothing.window_size = 6;
    let smoother = config.create_smoother().unwrap();
    assert_eq!(smoother.window_size(), 6);
    assert_eq!(smoother.name(), "ConfidenceWeightedSmoother");
}

#[test]
fn test_logger_from_config() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    assert!(config.create_logger().unwrap().file_path().is_none());

    let path = dir.path().join("log.jsonl");
    config.session_log.path = Some(path.clone());
    let logger = config.create_logger().unwrap();
    assert_eq!(logger.file_path(), Some(path.as_path()));
}

#[test]
fn test_missing_model_files_are_reported() {
    let mut config = Config::default();
    config.models.emotion_model = "/nonexistent/model.onnx".into();
    match config.check_model_files() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("Emotion model not found")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}
