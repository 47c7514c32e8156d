//! Mood lighting library: turns facial emotion into the color of a light.
//!
//! The library provides:
//! - ONNX Runtime emotion classification on `OpenCV` camera frames
//! - Temporal smoothing of noisy per-frame detections
//! - A lighting mapper with brightness, power, calibration and smooth fades
//! - A session log of emotion changes
//!
//! The refresh cycle consists of:
//! 1. Capture a frame and locate the largest face
//! 2. Classify its emotion through an [`inference::InferenceAdapter`]
//! 3. Smooth the detection over a sliding window
//! 4. Map the smoothed emotion to a color and fade the light toward it
//! 5. Record emotion changes in the session log
//!
//! # Examples
//!
//! ## Smoothing and Mapping
//!
//! ```no_run
//! use mood_lighting::{
//!     color::ColorTable,
//!     emotion::{Detection, Emotion},
//!     lighting::{LightingMapper, TransitionConfig},
//!     smoothing::create_smoother,
//! };
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut smoother = create_smoother("majority:5")?;
//! let mut mapper = LightingMapper::new(ColorTable::default(), TransitionConfig::default())
//!     .with_brightness(0.8)
//!     .with_power(true);
//!
//! let smoothed = smoother.push(&Detection::new(Emotion::Happy, 0.92, Utc::now()));
//! let color = mapper.update(Some(smoothed.emotion), Duration::from_millis(66));
//! println!("Light is now {}", color.to_hex());
//! # Ok(())
//! # }
//! ```
//!
//! ## Complete Pipeline
//!
//! ```no_run
//! use mood_lighting::{config::Config, pipeline::Pipeline, emotion::{Detection, Emotion}};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut pipeline = Pipeline::from_config(&config)?;
//!
//! for emotion in [Emotion::Happy, Emotion::Happy, Emotion::Sad] {
//!     let output = pipeline.process(Some(Detection::new(emotion, 0.8, Utc::now())), Duration::from_millis(66));
//!     println!("{} -> {}", output.smoothed.emotion, output.color);
//! }
//! println!("{} changes logged", pipeline.session_log().len());
//! # Ok(())
//! # }
//! ```

/// Emotion labels, score vectors and detections
pub mod emotion;

/// RGB colors and the emotion color table
pub mod color;

/// Temporal smoothing of emotion detections
pub mod smoothing;

/// Emotion to light color mapping with fades
pub mod lighting;

/// Ordered log of emotion changes
pub mod session_log;

/// Boundary between classifiers and the lighting core
pub mod inference;

/// ONNX emotion classifier with `OpenCV` face finding
pub mod emotion_detection;

/// Camera and video file access
pub mod capture;

/// One capture-to-light refresh cycle
pub mod pipeline;

/// Windows, overlays and key bindings
pub mod presentation;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
