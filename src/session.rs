//! The acquisition loop.
//!
//! A session moves through `Initializing -> Warmup -> Running -> Stopping ->
//! Released`. It owns the device for its whole life; the device and the
//! preview window are dropped on every exit path, including errors.

use image::RgbImage;
use std::error::Error as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::CaptureConfig;
use crate::decode;
use crate::negotiate::negotiate_resolution;
use crate::overlay::annotate;
use crate::preview::{Preview, PreviewInput};
use crate::stamp::FrameStamp;
use crate::storage::FrameWriter;
use crate::traits::{CameraDevice, CameraError, CaptureStream, Format, Frame, Resolution, Result};

/// Buffers requested from the driver for the capture stream.
const STREAM_BUFFERS: u32 = 4;
/// Longest sleep between two polls of the clock and the preview window.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Shortest sleep between polls, so time always advances.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Applying controls, negotiating resolution, creating outputs.
    Initializing,
    /// Discarding frames while the sensor settles.
    Warmup,
    /// Capturing at the configured rate.
    Running,
    /// Closing the preview and the stream.
    Stopping,
    /// Device released. Terminal.
    Released,
}

impl SessionState {
    fn advance(&mut self, next: Self) {
        debug!(from = ?*self, to = ?next, "session state");
        *self = next;
    }
}

/// Why a session stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured duration elapsed.
    DurationElapsed,
    /// Escape or `q` in the preview window, or the window was closed.
    UserQuit,
    /// The stop flag was raised (Ctrl-C).
    Interrupted,
}

/// Outcome of a session that stopped cleanly.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Frames captured during the running phase.
    pub frames_captured: u32,
    /// What ended the session.
    pub stop_reason: StopReason,
    /// Resolution the device ended up on after negotiation.
    pub resolution: Resolution,
    /// Directory frames were written to, when saving.
    pub output_dir: Option<PathBuf>,
}

type PreviewFactory = Box<dyn FnOnce(Resolution) -> Result<Box<dyn Preview>>>;

/// One bounded run of the acquisition loop over an owned device.
pub struct Session<D, C> {
    device: D,
    clock: C,
    config: CaptureConfig,
    open_preview: Option<PreviewFactory>,
    state: SessionState,
}

impl<D: CameraDevice, C: Clock> Session<D, C> {
    /// Take ownership of `device` for a session configured by `config`.
    pub fn new(device: D, clock: C, config: CaptureConfig) -> Self {
        Self {
            device,
            clock,
            config,
            open_preview: None,
            state: SessionState::Initializing,
        }
    }

    /// Show frames in a preview opened once the resolution is known.
    ///
    /// Only used when the configuration enables preview.
    #[must_use]
    pub fn with_preview<F, P>(mut self, open: F) -> Self
    where
        F: FnOnce(Resolution) -> Result<P> + 'static,
        P: Preview + 'static,
    {
        self.open_preview = Some(Box::new(move |resolution| {
            open(resolution).map(|preview| Box::new(preview) as Box<dyn Preview>)
        }));
        self
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion.
    ///
    /// `stop` is polled before every warmup read and once per loop
    /// iteration. Any error ends the session and is logged here with its
    /// sources; the device is released before this returns either way.
    pub fn run(mut self, stop: &AtomicBool) -> Result<SessionSummary> {
        let outcome = self.acquire(stop);
        self.state.advance(SessionState::Stopping);

        match &outcome {
            Ok(summary) => info!(
                frames = summary.frames_captured,
                reason = ?summary.stop_reason,
                "capture stopped"
            ),
            Err(err) => error!(error = %error_chain(err), "capture failed, stopping"),
        }

        let Self {
            device, mut state, ..
        } = self;
        drop(device);
        state.advance(SessionState::Released);
        info!("camera released");

        outcome
    }

    fn initialize(&mut self) -> Result<(Format, Option<FrameWriter>, Option<Box<dyn Preview>>)> {
        for &(control, value) in &self.config.controls {
            match self.device.control(control) {
                Ok(initial) => info!(%control, value = initial, "initial camera setting"),
                Err(err) => warn!(%control, error = %err, "cannot read camera setting"),
            }
            if let Err(err) = self.device.set_control(control, value) {
                warn!(%control, value, error = %err, "cannot apply camera setting");
            }
        }

        let resolution = negotiate_resolution(&mut self.device, &self.config.resolutions)?;
        let format = self.device.format()?;

        let writer = match &self.config.save_path {
            Some(parent) => Some(FrameWriter::create(
                parent,
                &self.clock.wall_time(),
                self.config.jpeg_quality,
            )?),
            None => None,
        };

        let preview = match self.open_preview.take() {
            Some(open) if self.config.preview => Some(open(resolution)?),
            _ => None,
        };

        Ok((format, writer, preview))
    }

    fn acquire(&mut self, stop: &AtomicBool) -> Result<SessionSummary> {
        let start = self.clock.elapsed();
        let (format, writer, mut preview) = self.initialize()?;
        let output_dir = writer.as_ref().map(|writer| writer.dir().to_path_buf());

        let mut stream = self.device.create_stream(STREAM_BUFFERS)?;

        self.state.advance(SessionState::Warmup);
        for _ in 0..self.config.warmup_frames {
            if stop.load(Ordering::Relaxed) {
                return Ok(SessionSummary {
                    frames_captured: 0,
                    stop_reason: StopReason::Interrupted,
                    resolution: format.resolution(),
                    output_dir,
                });
            }
            stream.next_frame()?;
        }

        self.state.advance(SessionState::Running);
        let period = self.config.frame_interval;
        let mut last_capture = start;
        let mut sequence: u32 = 0;

        let stop_reason = loop {
            if stop.load(Ordering::Relaxed) {
                break StopReason::Interrupted;
            }

            if self.clock.elapsed().saturating_sub(last_capture) >= period {
                let frame = stream.next_frame()?;
                last_capture = self.clock.elapsed();

                let stamp = FrameStamp::new(self.clock.wall_time(), sequence);
                let input =
                    handle_frame(&frame, &format, &stamp, writer.as_ref(), preview.as_mut())?;
                sequence += 1;

                if input == PreviewInput::Quit {
                    break StopReason::UserQuit;
                }
            } else if let Some(preview) = preview.as_mut() {
                if preview.poll()? == PreviewInput::Quit {
                    break StopReason::UserQuit;
                }
            }

            if self.clock.elapsed().saturating_sub(start) > self.config.duration {
                break StopReason::DurationElapsed;
            }

            let since_capture = self.clock.elapsed().saturating_sub(last_capture);
            let until_next = period.saturating_sub(since_capture);
            self.clock
                .sleep(until_next.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL));
        };

        Ok(SessionSummary {
            frames_captured: sequence,
            stop_reason,
            resolution: format.resolution(),
            output_dir,
        })
    }
}

/// Save and/or display one frame. Saved images carry no annotation.
fn handle_frame(
    frame: &Frame,
    format: &Format,
    stamp: &FrameStamp,
    writer: Option<&FrameWriter>,
    preview: Option<&mut Box<dyn Preview>>,
) -> Result<PreviewInput> {
    let mut image: RgbImage = decode::to_rgb(frame, format)?;

    if let Some(writer) = writer {
        writer.write(&image, stamp)?;
    }

    debug!(%stamp, "captured frame");

    match preview {
        Some(preview) => {
            annotate(&mut image, &stamp.to_string());
            preview.show(&image)
        }
        None => Ok(PreviewInput::Continue),
    }
}

/// Render an error with all of its sources, outermost first.
fn error_chain(err: &CameraError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
