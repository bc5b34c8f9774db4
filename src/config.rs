//! Command-line arguments and the immutable capture configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::negotiate::STANDARD_RESOLUTIONS;
use crate::traits::{CameraControl, Resolution};

/// Frame rates at or above this are rejected.
pub const MAX_FPS: f64 = 60.0;

/// Frames discarded after start-up while auto exposure settles.
pub const DEFAULT_WARMUP_FRAMES: u32 = 100;

/// JPEG quality for saved frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 99;

/// Control values applied before warmup.
pub const DEFAULT_CONTROLS: [(CameraControl, i64); 2] = [
    (CameraControl::Brightness, 100),
    (CameraControl::Contrast, 135),
];

/// Acquire time lapse images from a USB webcam.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Duration of acquisition in minutes
    #[arg(short, long)]
    pub duration: u64,

    /// Index of the video device (/dev/videoN)
    #[arg(long = "opencv_id", visible_alias = "device", default_value_t = 0)]
    pub device_index: u32,

    /// Number of images to acquire per second
    #[arg(long, default_value_t = 1.0)]
    pub fps: f64,

    /// Show a live preview window
    #[arg(long)]
    pub preview: bool,

    /// Save frames to disk
    #[arg(long)]
    pub save: bool,

    /// Directory to write images to (default: current directory)
    #[arg(long = "save_path")]
    pub save_path: Option<PathBuf>,

    /// Frames to discard before timing begins
    #[arg(long = "warmup_frames", default_value_t = DEFAULT_WARMUP_FRAMES)]
    pub warmup_frames: u32,
}

/// Reasons a set of arguments cannot start a session.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Frame rate outside `(0, 60)`.
    #[error("Make fps < 60 and > 0, not: {0}")]
    InvalidFps(f64),
    /// Neither preview nor save was requested.
    #[error("Without previewing or saving, there is nothing to do")]
    NothingToDo,
    /// The default save path could not be determined.
    #[error("Cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Everything a capture session needs, fixed before it starts.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// V4L2 device index.
    pub device_index: u32,
    /// Target frames per second.
    pub fps: f64,
    /// Time between captured frames, `1 / fps`.
    pub frame_interval: Duration,
    /// Total session length.
    pub duration: Duration,
    /// Whether frames are shown on screen.
    pub preview: bool,
    /// Parent directory for the session directory, if saving.
    pub save_path: Option<PathBuf>,
    /// Frames discarded before timing begins.
    pub warmup_frames: u32,
    /// Resolutions tried, in order, during negotiation.
    pub resolutions: Vec<Resolution>,
    /// Control values applied at start-up.
    pub controls: Vec<(CameraControl, i64)>,
    /// JPEG quality (1-100) for saved frames.
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            fps: 1.0,
            frame_interval: Duration::from_secs(1),
            duration: Duration::ZERO,
            preview: false,
            save_path: None,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            resolutions: STANDARD_RESOLUTIONS.to_vec(),
            controls: DEFAULT_CONTROLS.to_vec(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CaptureConfig {
    /// Whether frames are written to disk.
    #[must_use]
    pub const fn saving(&self) -> bool {
        self.save_path.is_some()
    }
}

impl Args {
    /// Validate the arguments and build the session configuration.
    pub fn into_config(self) -> Result<CaptureConfig, ConfigError> {
        if !self.fps.is_finite() || self.fps <= 0.0 || self.fps >= MAX_FPS {
            return Err(ConfigError::InvalidFps(self.fps));
        }
        let frame_interval = Duration::try_from_secs_f64(1.0 / self.fps)
            .map_err(|_| ConfigError::InvalidFps(self.fps))?;
        if !self.preview && !self.save {
            return Err(ConfigError::NothingToDo);
        }

        let save_path = if self.save {
            match self.save_path {
                Some(path) => Some(path),
                None => Some(std::env::current_dir().map_err(ConfigError::CurrentDir)?),
            }
        } else {
            None
        };

        Ok(CaptureConfig {
            device_index: self.device_index,
            fps: self.fps,
            frame_interval,
            duration: Duration::from_secs(self.duration.saturating_mul(60)),
            preview: self.preview,
            save_path,
            warmup_frames: self.warmup_frames,
            ..CaptureConfig::default()
        })
    }
}
