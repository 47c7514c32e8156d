//! Rendering of the lighting state and collection of user controls.

use crate::{
    color::ColorRgb,
    constants::{BRIGHTNESS_STEP, FRAME_BLEND_WEIGHT, MIN_PANEL_HEIGHT, MIN_PANEL_WIDTH, OVERLAY_BLEND_WEIGHT},
    emotion::{Emotion, EmotionScores},
    pipeline::{ControlInput, CycleOutput},
    session_log::SessionLogEntry,
    Error, Result,
};
use log::{debug, info};
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, CV_8UC3},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use std::str::FromStr;

const CAMERA_WINDOW: &str = "Mood Lighting Camera";
const PANEL_WINDOW: &str = "Mood Lighting";
const KEY_ESCAPE: u8 = 27;

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMode {
    /// Camera window and control panel
    All,
    /// Control panel only
    Panel,
    /// Camera window only
    Camera,
    /// No GUI (headless)
    None,
}

impl GuiMode {
    #[must_use]
    pub fn shows_camera(self) -> bool {
        matches!(self, GuiMode::All | GuiMode::Camera)
    }

    #[must_use]
    pub fn shows_panel(self) -> bool {
        matches!(self, GuiMode::All | GuiMode::Panel)
    }
}

impl FromStr for GuiMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(GuiMode::All),
            "panel" => Ok(GuiMode::Panel),
            "cam" | "camera" => Ok(GuiMode::Camera),
            "none" | "headless" => Ok(GuiMode::None),
            other => Err(Error::InvalidInput(format!("Unknown GUI mode: {other}"))),
        }
    }
}

/// Borrowed view of one cycle, handed to a [`Presenter`]
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Camera frame (BGR), absent when capture failed this tick
    pub frame: Option<&'a Mat>,
    pub cycle: &'a CycleOutput,
    pub scores: Option<&'a EmotionScores>,
    /// Most recent session log entries, oldest first
    pub log_tail: &'a [SessionLogEntry],
    pub window_size: usize,
    pub smoother: &'a str,
    pub fps: f64,
}

/// Output surface for the lighting loop
pub trait Presenter {
    /// Draw one cycle
    fn render(&mut self, view: &FrameView<'_>) -> Result<()>;

    /// Controls entered since the last poll
    fn poll_controls(&mut self) -> Result<Vec<ControlInput>>;

    /// Show a transient status message; an empty message clears it
    fn show_status(&mut self, message: &str);
}

/// Map a key code from `highgui::wait_key` to a control
#[must_use]
pub fn control_for_key(key: i32) -> Option<ControlInput> {
    if key < 0 {
        return None;
    }
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let key = (key & 0xFF) as u8;

    match key {
        b'o' | b'O' => Some(ControlInput::Toggle),
        b'+' | b'=' => Some(ControlInput::AdjustBrightness(BRIGHTNESS_STEP)),
        b'-' | b'_' => Some(ControlInput::AdjustBrightness(-BRIGHTNESS_STEP)),
        b'0' => Some(ControlInput::Calibrate(None)),
        b'1'..=b'7' => Some(ControlInput::Calibrate(Some(Emotion::ALL[usize::from(key - b'1')]))),
        b'[' => Some(ControlInput::AdjustWindowSize(-1)),
        b']' => Some(ControlInput::AdjustWindowSize(1)),
        b'x' | b'X' => Some(ControlInput::ClearLog),
        b'q' | b'Q' | KEY_ESCAPE => Some(ControlInput::Quit),
        _ => None,
    }
}

/// `OpenCV` expects BGR channel order
fn bgr(color: ColorRgb) -> Scalar {
    Scalar::new(f64::from(color.b), f64::from(color.g), f64::from(color.r), 0.0)
}

fn text_color_on(background: ColorRgb) -> Scalar {
    if background.is_light() {
        Scalar::new(0.0, 0.0, 0.0, 0.0)
    } else {
        Scalar::new(255.0, 255.0, 255.0, 0.0)
    }
}

fn put_line(image: &mut Mat, text: &str, origin: Point, scale: f64, color: Scalar) -> Result<()> {
    imgproc::put_text(image, text, origin, FONT_HERSHEY_SIMPLEX, scale, color, 1, LINE_8, false)?;
    Ok(())
}

/// Tint a frame with the light color
pub fn blend_overlay(frame: &Mat, color: ColorRgb) -> Result<Mat> {
    let overlay = Mat::new_rows_cols_with_default(frame.rows(), frame.cols(), frame.typ(), bgr(color))?;
    let mut blended = Mat::default();
    core::add_weighted(
        frame,
        FRAME_BLEND_WEIGHT,
        &overlay,
        OVERLAY_BLEND_WEIGHT,
        0.0,
        &mut blended,
        -1,
    )?;
    Ok(blended)
}

/// Camera frame tinted by the light. Without a frame the tint fills a blank
/// `width` x `height` canvas so the window keeps showing the light and status.
pub fn camera_canvas(frame: Option<&Mat>, color: ColorRgb, width: i32, height: i32) -> Result<Mat> {
    match frame {
        Some(frame) => blend_overlay(frame, color),
        None => blend_overlay(&Mat::zeros(height, width, CV_8UC3)?.to_mat()?, color),
    }
}

/// Detection label, FPS and the status message drawn over the camera canvas
pub fn draw_camera_overlay(display: &mut Mat, view: &FrameView<'_>, status: Option<&str>) -> Result<()> {
    let label = match &view.cycle.detection {
        Some(d) => format!("{} ({:.0}%)", d.emotion, d.confidence * 100.0),
        None => "no face".to_string(),
    };
    imgproc::put_text(
        display,
        &label,
        Point::new(10, 30),
        FONT_HERSHEY_SIMPLEX,
        1.0,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        2,
        LINE_8,
        false,
    )?;
    put_line(
        display,
        &format!("FPS: {:.1}", view.fps),
        Point::new(10, 60),
        0.6,
        Scalar::new(0.0, 255.0, 0.0, 0.0),
    )?;
    if let Some(message) = status {
        let y = display.rows() - 15;
        put_line(display, message, Point::new(10, y), 0.6, Scalar::new(0.0, 0.0, 255.0, 0.0))?;
    }
    Ok(())
}

/// HighGUI windows: camera feed tinted by the light, plus a status panel
pub struct HighGuiPresenter {
    mode: GuiMode,
    width: i32,
    height: i32,
    show_scores: bool,
    status: Option<String>,
}

impl HighGuiPresenter {
    /// Create the windows for `mode`
    pub fn new(mode: GuiMode, width: i32, height: i32, show_scores: bool) -> Result<Self> {
        if width < MIN_PANEL_WIDTH || height < MIN_PANEL_HEIGHT {
            return Err(Error::InvalidInput(format!(
                "Window size {width}x{height} is below the minimum {MIN_PANEL_WIDTH}x{MIN_PANEL_HEIGHT}"
            )));
        }
        if mode.shows_camera() {
            highgui::named_window(CAMERA_WINDOW, WINDOW_NORMAL)?;
        }
        if mode.shows_panel() {
            highgui::named_window(PANEL_WINDOW, WINDOW_NORMAL)?;
            highgui::resize_window(PANEL_WINDOW, width, height)?;
        }
        info!("HighGUI presenter ready ({mode:?})");

        Ok(Self {
            mode,
            width,
            height,
            show_scores,
            status: None,
        })
    }

    fn render_camera(&self, view: &FrameView<'_>) -> Result<()> {
        let mut display = camera_canvas(view.frame, view.cycle.color, self.width, self.height)?;
        draw_camera_overlay(&mut display, view, self.status.as_deref())?;
        highgui::imshow(CAMERA_WINDOW, &display)?;
        Ok(())
    }

    fn render_panel(&self, view: &FrameView<'_>) -> Result<()> {
        let mut panel = Mat::zeros(self.height, self.width, CV_8UC3)?.to_mat()?;
        let lighting = &view.cycle.lighting;
        let white = Scalar::new(255.0, 255.0, 255.0, 0.0);
        let grey = Scalar::new(170.0, 170.0, 170.0, 0.0);

        // Light swatch with hex code
        let swatch = Rect::new(10, 10, (self.width - 20).max(1), 90);
        imgproc::rectangle(&mut panel, swatch, bgr(lighting.color), -1, LINE_8, 0)?;
        put_line(
            &mut panel,
            &lighting.color.to_hex(),
            Point::new(20, 65),
            0.9,
            text_color_on(lighting.color),
        )?;

        let mut y = 130;
        let status = if lighting.is_on { "ON" } else { "OFF" };
        put_line(
            &mut panel,
            &format!("Light: {status}   Brightness: {:.0}%", lighting.brightness * 100.0),
            Point::new(10, y),
            0.55,
            white,
        )?;
        y += 25;
        put_line(
            &mut panel,
            &format!(
                "Emotion: {} ({:.0}%)",
                view.cycle.smoothed.emotion,
                view.cycle.smoothed.confidence * 100.0
            ),
            Point::new(10, y),
            0.55,
            white,
        )?;
        y += 25;
        put_line(
            &mut panel,
            &format!("Smoothing: {} / {}", view.smoother, view.window_size),
            Point::new(10, y),
            0.5,
            grey,
        )?;
        if let Some(emotion) = lighting.calibration {
            y += 25;
            put_line(
                &mut panel,
                &format!("CALIBRATING: {emotion}"),
                Point::new(10, y),
                0.55,
                Scalar::new(0.0, 200.0, 255.0, 0.0),
            )?;
        }

        if self.show_scores {
            if let Some(scores) = view.scores {
                y += 30;
                for (emotion, score) in scores.ranked() {
                    put_line(
                        &mut panel,
                        &format!("{:>9} {:5.1}%", emotion.as_str(), score * 100.0),
                        Point::new(10, y),
                        0.45,
                        grey,
                    )?;
                    #[allow(clippy::cast_possible_truncation)]
                    let bar = (score * 150.0) as i32;
                    if bar > 0 {
                        imgproc::rectangle(
                            &mut panel,
                            Rect::new(170, y - 10, bar, 10),
                            bgr(crate::color::default_color(emotion)),
                            -1,
                            LINE_8,
                            0,
                        )?;
                    }
                    y += 18;
                }
            }
        }

        y += 20;
        put_line(&mut panel, "Session log", Point::new(10, y), 0.5, white)?;
        for entry in view.log_tail.iter().rev() {
            y += 18;
            if y > self.height - 30 {
                break;
            }
            put_line(
                &mut panel,
                &format!("{}  {}", entry.timestamp.format("%H:%M:%S"), entry.emotion),
                Point::new(10, y),
                0.45,
                grey,
            )?;
        }

        if let Some(message) = &self.status {
            put_line(
                &mut panel,
                message,
                Point::new(10, self.height - 10),
                0.5,
                Scalar::new(0.0, 0.0, 255.0, 0.0),
            )?;
        }

        highgui::imshow(PANEL_WINDOW, &panel)?;
        Ok(())
    }
}

impl Presenter for HighGuiPresenter {
    fn render(&mut self, view: &FrameView<'_>) -> Result<()> {
        if self.mode.shows_camera() {
            self.render_camera(view)?;
        }
        if self.mode.shows_panel() {
            self.render_panel(view)?;
        }
        Ok(())
    }

    fn poll_controls(&mut self) -> Result<Vec<ControlInput>> {
        let key = highgui::wait_key(1)?;
        Ok(control_for_key(key).into_iter().collect())
    }

    fn show_status(&mut self, message: &str) {
        self.status = if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        };
    }
}

impl Drop for HighGuiPresenter {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            debug!("Failed to destroy windows: {e}");
        }
    }
}

/// Presenter without windows; reports changes through the log
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    last_emotion: Option<Emotion>,
    last_color: Option<ColorRgb>,
    last_status: Option<String>,
    frames: u64,
}

impl HeadlessPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cycles rendered
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for HeadlessPresenter {
    fn render(&mut self, view: &FrameView<'_>) -> Result<()> {
        self.frames += 1;
        let lighting = &view.cycle.lighting;

        if self.last_emotion != Some(lighting.emotion) {
            info!("Emotion: {} -> target {}", lighting.emotion, lighting.target.to_hex());
            self.last_emotion = Some(lighting.emotion);
        }
        if self.last_color != Some(lighting.color) {
            debug!(
                "Light {} {} at {:.0}%",
                if lighting.is_on { "on" } else { "off" },
                lighting.color.to_hex(),
                lighting.brightness * 100.0
            );
            self.last_color = Some(lighting.color);
        }
        Ok(())
    }

    fn poll_controls(&mut self) -> Result<Vec<ControlInput>> {
        Ok(Vec::new())
    }

    fn show_status(&mut self, message: &str) {
        if message.is_empty() {
            self.last_status = None;
        } else if self.last_status.as_deref() != Some(message) {
            info!("{message}");
            self.last_status = Some(message.to_string());
        }
    }
}
