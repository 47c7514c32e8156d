//! Constants used throughout the application

/// Number of emotions in the closed label set
pub const NUM_EMOTIONS: usize = 7;

/// Default smoothing window (frames)
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

/// Upper bound accepted for the smoothing window
pub const MAX_SMOOTHING_WINDOW: usize = 120;

/// Default brightness factor
pub const DEFAULT_BRIGHTNESS: f64 = 0.7;

/// Step applied by the brightness keys
pub const BRIGHTNESS_STEP: f64 = 0.1;

/// Default fraction of the remaining distance covered per update
pub const DEFAULT_TRANSITION_ALPHA: f64 = 0.25;

/// Default bound on a single channel change per update
pub const DEFAULT_MAX_CHANNEL_STEP: f64 = 48.0;

/// Channel distance under which the color snaps to the target
pub const DEFAULT_SNAP_THRESHOLD: f64 = 0.5;

/// Default refresh rate of the lighting loop
pub const DEFAULT_TARGET_FPS: u32 = 15;

/// Delay between attempts to reopen a camera that is not available
pub const CAMERA_RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

/// Smallest panel that still fits the swatch, status and log tail
pub const MIN_PANEL_WIDTH: i32 = 240;
pub const MIN_PANEL_HEIGHT: i32 = 240;

/// Side length of the square grayscale face crop fed to the emotion model
pub const EMOTION_INPUT_SIZE: i32 = 64;

/// Smallest face the cascade will report (pixels)
pub const MIN_FACE_SIZE: i32 = 48;

/// Blend weights for the camera frame and the light overlay
pub const FRAME_BLEND_WEIGHT: f64 = 0.6;
pub const OVERLAY_BLEND_WEIGHT: f64 = 0.4;

/// Number of log entries shown by the presentation layer
pub const LOG_TAIL_LEN: usize = 10;

/// Channel sum above which overlay text is drawn dark
pub const LIGHT_COLOR_SUM: u32 = 400;
