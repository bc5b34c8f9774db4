//! Timelapse-capture binary: acquire timelapse images from a USB webcam.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use timelapse_capture::{Args, CameraDevice, CaptureConfig, Session, SystemClock, V4L2Device};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

/// Set-up errors come back as `Err`. A failed session has already been
/// logged by `Session::run` and only changes the exit code.
fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = args.into_config()?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, stopping capture");
        handler_stop.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl+C handler")?;

    let device = V4L2Device::open(config.device_index)
        .with_context(|| format!("failed to open /dev/video{}", config.device_index))?;

    let caps = device.capabilities();
    info!(card = %caps.card, driver = %caps.driver, bus = %caps.bus_info, "camera opened");

    let session = Session::new(device, SystemClock::new(), config.clone());
    let session = attach_preview(session, &config)?;
    let Ok(summary) = session.run(&stop) else {
        return Ok(ExitCode::FAILURE);
    };

    match &summary.output_dir {
        Some(dir) => info!(
            frames = summary.frames_captured,
            resolution = %summary.resolution,
            dir = %dir.display(),
            "timelapse complete"
        ),
        None => info!(
            frames = summary.frames_captured,
            resolution = %summary.resolution,
            "timelapse complete"
        ),
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "preview")]
fn attach_preview(
    session: Session<V4L2Device, SystemClock>,
    config: &CaptureConfig,
) -> anyhow::Result<Session<V4L2Device, SystemClock>> {
    use timelapse_capture::preview::WindowPreview;

    if !config.preview {
        return Ok(session);
    }
    Ok(session.with_preview(|resolution| WindowPreview::open("preview", resolution)))
}

#[cfg(not(feature = "preview"))]
fn attach_preview(
    session: Session<V4L2Device, SystemClock>,
    config: &CaptureConfig,
) -> anyhow::Result<Session<V4L2Device, SystemClock>> {
    if config.preview {
        anyhow::bail!("--preview requires building with the `preview` feature");
    }
    Ok(session)
}
