//! Mood lighting application: webcam emotion drives the color of a light.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mood_lighting::{
    app::MoodLightingApp,
    config::{Config, EXAMPLE_CONFIG},
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to process instead of the camera
    #[arg(short, long)]
    video: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Smoothing method (majority, weighted, none), optionally with a window: majority:15
    #[arg(short, long)]
    smoother: Option<String>,

    /// Smoothing window size
    #[arg(short, long)]
    window: Option<usize>,

    /// Initial brightness (0.0 to 1.0)
    #[arg(short, long)]
    brightness: Option<f64>,

    /// Transition speed: fraction of the remaining fade covered per cycle (0.0 to 1.0]
    #[arg(short, long)]
    alpha: Option<f64>,

    /// GUI display mode (all, panel, cam, none)
    #[arg(short, long)]
    gui: Option<String>,

    /// Append emotion changes to this JSON-lines file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Mirror the camera image horizontally
    #[arg(long)]
    mirror: Option<bool>,

    /// Switch the light on at startup
    #[arg(long)]
    on: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Command line values take precedence over the configuration file
    fn apply_to(self, config: &mut Config) {
        if let Some(cam) = self.cam {
            config.camera.index = cam;
        }
        if let Some(video) = self.video {
            config.camera.video_file = Some(video);
        }
        if let Some(mirror) = self.mirror {
            config.camera.mirror = mirror;
        }
        if let Some(smoother) = self.smoother {
            match smoother.split_once(':') {
                Some((method, window)) => {
                    config.smoothing.method = method.to_string();
                    if let Ok(window) = window.trim().parse() {
                        config.smoothing.window_size = window;
                    } else {
                        // Leave the malformed spec in place so validation reports it
                        config.smoothing.method = smoother;
                    }
                }
                None => config.smoothing.method = smoother,
            }
        }
        if let Some(window) = self.window {
            config.smoothing.window_size = window;
        }
        if let Some(brightness) = self.brightness {
            config.lighting.brightness = brightness;
        }
        if let Some(alpha) = self.alpha {
            config.lighting.transition_alpha = alpha;
        }
        if self.on {
            config.lighting.start_on = true;
        }
        if let Some(gui) = self.gui {
            config.display.gui_mode = gui;
        }
        if let Some(path) = self.log_file {
            config.session_log.path = Some(path);
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Mood Lighting");

    // Load configuration if provided
    let mut config = match &args.config {
        Some(config_path) => {
            info!("Loading configuration from: {}", config_path);
            Config::from_file(config_path).with_context(|| format!("Failed to load config file {config_path}"))?
        }
        None => Config::default(),
    };
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    // Create and run application
    let mut app = MoodLightingApp::new(&config)?;
    app.run()?;

    Ok(())
}
