//! Main application module for mood lighting.

use crate::{
    capture::{Camera, VideoSource},
    config::Config,
    constants::{CAMERA_RETRY_INTERVAL, LOG_TAIL_LEN},
    emotion_detection::OnnxEmotionDetector,
    error::Result,
    inference::{detect_or_skip, InferenceAdapter},
    pipeline::Pipeline,
    presentation::{FrameView, GuiMode, HeadlessPresenter, HighGuiPresenter, Presenter},
};
use chrono::Utc;
use log::{debug, info, warn};
use opencv::core::Mat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Fixed-rate scheduler for the refresh loop
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    last: Instant,
    deadline: Instant,
}

impl Ticker {
    /// Create a ticker running at `fps` ticks per second
    ///
    /// # Panics
    ///
    /// Panics if `fps` is 0
    #[must_use]
    pub fn new(fps: u32) -> Self {
        assert!(fps > 0, "Tick rate must be greater than 0");
        let period = Duration::from_secs(1) / fps;
        let now = Instant::now();
        Self {
            period,
            last: now,
            deadline: now + period,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until the next tick; returns the time since the previous one
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        if self.deadline > now {
            thread::sleep(self.deadline - now);
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        self.deadline = next_deadline(self.deadline, now, self.period);
        elapsed
    }
}

/// Deadline following `deadline`. Ticks already missed at `now` are dropped.
#[must_use]
pub fn next_deadline(deadline: Instant, now: Instant, period: Duration) -> Instant {
    let next = deadline + period;
    if next <= now {
        now + period
    } else {
        next
    }
}

/// Outcome of one capture attempt
enum Capture {
    Frame(Mat),
    Missing,
    EndOfFile,
}

/// Camera to reopen while none is available
struct Reconnect {
    source: VideoSource,
    mirror: bool,
    next_attempt: Instant,
}

/// Main application struct
pub struct MoodLightingApp {
    camera: Option<Camera>,
    reconnect: Option<Reconnect>,
    detector: Box<dyn InferenceAdapter<Frame = Mat>>,
    pipeline: Pipeline,
    presenter: Box<dyn Presenter>,
    ticker: Ticker,
    stop: Arc<AtomicBool>,
}

impl MoodLightingApp {
    /// Create the application from a validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        info!("Initializing Mood Lighting application");
        config.validate()?;
        config.check_model_files()?;

        let detector = OnnxEmotionDetector::new(
            &config.models.emotion_model,
            &config.models.face_cascade,
            config.models.labels.clone(),
        )?
        .with_cascade_params(config.cascade_params())
        .with_input_size(config.models.input_size)
        .with_pixel_scale(config.models.pixel_scale);

        let pipeline = Pipeline::from_config(config)?;

        let gui_mode: GuiMode = config.display.gui_mode.parse()?;
        let presenter: Box<dyn Presenter> = if gui_mode == GuiMode::None {
            Box::new(HeadlessPresenter::new())
        } else {
            Box::new(HighGuiPresenter::new(
                gui_mode,
                config.display.window_width,
                config.display.window_height,
                config.display.show_scores,
            )?)
        };

        let app = match &config.camera.video_file {
            Some(path) => {
                let camera = Camera::open(VideoSource::File(path.clone()), config.camera.mirror)?;
                Self::from_parts(
                    Some(camera),
                    Box::new(detector),
                    pipeline,
                    presenter,
                    config.display.target_fps,
                )
            }
            None => {
                let source = VideoSource::Camera(config.camera.index);
                let camera = match Camera::open(source.clone(), config.camera.mirror) {
                    Ok(camera) => Some(camera),
                    Err(e) => {
                        warn!("Camera unavailable, lighting controls stay active: {e}");
                        None
                    }
                };
                Self::from_parts(camera, Box::new(detector), pipeline, presenter, config.display.target_fps)
                    .with_reconnect(source, config.camera.mirror)
            }
        };
        Ok(app)
    }

    /// Assemble the application from already constructed parts.
    /// `camera` may be `None`; the loop then runs on controls alone.
    #[must_use]
    pub fn from_parts(
        camera: Option<Camera>,
        detector: Box<dyn InferenceAdapter<Frame = Mat>>,
        pipeline: Pipeline,
        presenter: Box<dyn Presenter>,
        target_fps: u32,
    ) -> Self {
        Self {
            camera,
            reconnect: None,
            detector,
            pipeline,
            presenter,
            ticker: Ticker::new(target_fps),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reopen `source` every [`CAMERA_RETRY_INTERVAL`] while no camera is open
    #[must_use]
    pub fn with_reconnect(mut self, source: VideoSource, mirror: bool) -> Self {
        self.reconnect = Some(Reconnect {
            source,
            mirror,
            next_attempt: Instant::now() + CAMERA_RETRY_INTERVAL,
        });
        self
    }

    #[must_use]
    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    fn try_reconnect(&mut self) {
        let Some(reconnect) = &mut self.reconnect else {
            return;
        };
        let now = Instant::now();
        if now < reconnect.next_attempt {
            return;
        }
        reconnect.next_attempt = now + CAMERA_RETRY_INTERVAL;

        match Camera::open(reconnect.source.clone(), reconnect.mirror) {
            Ok(camera) => {
                info!("Camera available again");
                self.camera = Some(camera);
            }
            Err(e) => debug!("Camera still unavailable: {e}"),
        }
    }

    /// Read one frame, updating the status message on failure
    fn next_frame(&mut self) -> Capture {
        if self.camera.is_none() {
            self.try_reconnect();
        }
        let Some(camera) = self.camera.as_mut() else {
            self.presenter.show_status("Camera unavailable");
            return Capture::Missing;
        };

        match camera.read_frame() {
            Ok(Some(frame)) => {
                self.presenter.show_status("");
                Capture::Frame(frame)
            }
            Ok(None) if camera.source().is_file() => Capture::EndOfFile,
            Ok(None) => {
                self.presenter.show_status("No frame from camera");
                Capture::Missing
            }
            Err(e) => {
                warn!("Failed to read frame: {e}");
                self.presenter.show_status("Camera unavailable");
                if self.reconnect.is_some() {
                    self.camera = None;
                }
                Capture::Missing
            }
        }
    }

    /// Flag that ends [`run`](Self::run) at the next tick when set
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run the refresh loop until quit, end of video or external stop
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Starting main loop at {:.1} Hz using {}",
            1.0 / self.ticker.period().as_secs_f64(),
            self.detector.name()
        );

        let mut frame_count: u64 = 0;
        let mut window_frames: u32 = 0;
        let mut last_fps_update = Instant::now();
        let mut fps = 0.0;

        while !self.stop.load(Ordering::Relaxed) {
            let elapsed = self.ticker.wait();

            let frame = match self.next_frame() {
                Capture::Frame(frame) => Some(frame),
                Capture::Missing => None,
                Capture::EndOfFile => {
                    info!("End of video file reached");
                    break;
                }
            };

            let detection = frame
                .as_ref()
                .and_then(|f| detect_or_skip(self.detector.as_mut(), f, Utc::now()));
            let output = self.pipeline.process(detection, elapsed);

            frame_count += 1;
            window_frames += 1;
            if last_fps_update.elapsed() >= Duration::from_secs(1) {
                fps = f64::from(window_frames) / last_fps_update.elapsed().as_secs_f64();
                window_frames = 0;
                last_fps_update = Instant::now();
            }

            let view = FrameView {
                frame: frame.as_ref(),
                cycle: &output,
                scores: self.pipeline.latest_scores(),
                log_tail: self.pipeline.session_log().recent(LOG_TAIL_LEN),
                window_size: self.pipeline.smoother().window_size(),
                smoother: self.pipeline.smoother().name(),
                fps,
            };
            self.presenter.render(&view)?;

            for control in self.presenter.poll_controls()? {
                if !self.pipeline.apply(control) {
                    info!("Exit requested by user");
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
        }

        info!(
            "Application shutting down after {} cycles, {} emotion changes logged",
            frame_count,
            self.pipeline.session_log().len()
        );
        Ok(())
    }
}
