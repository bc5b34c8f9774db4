//! Best-effort format negotiation with readback verification.
//!
//! Drivers silently adjust formats they cannot produce, so every request is
//! followed by a fresh read of the device format. A mismatch is reported
//! and skipped; the device keeps whatever it last accepted.

use tracing::{debug, info, warn};

use crate::decode::{is_decodable, DECODABLE_FOURCCS};
use crate::traits::{CameraDevice, CameraError, Format, FourCC, Resolution, Result};

/// Standard resolutions tried in ascending order, ending at 1920x1080.
pub const STANDARD_RESOLUTIONS: [Resolution; 7] = [
    Resolution::new(320, 240),
    Resolution::new(640, 360),
    Resolution::new(640, 480),
    Resolution::new(800, 600),
    Resolution::new(1280, 720),
    Resolution::new(1440, 900),
    Resolution::new(1920, 1080),
];

/// Request `resolution` and verify the device reports it back.
///
/// Keeps the current pixel format. Returns
/// [`CameraError::FormatNotSupported`] when the readback differs.
pub fn try_resolution<D: CameraDevice>(device: &mut D, resolution: Resolution) -> Result<Resolution> {
    let current = device.format()?;
    device.set_format(&current.with_resolution(resolution))?;

    let actual = device.format()?.resolution();
    if actual != resolution {
        return Err(CameraError::FormatNotSupported {
            requested: resolution,
            actual,
        });
    }
    Ok(actual)
}

/// Make sure the device delivers frames the decoder understands.
///
/// A device already in a decodable format is left alone. Otherwise each
/// decodable format is requested at the current resolution until one reads
/// back. Returns the pixel format the device ends on, which is still
/// undecodable when the driver refused all of them.
pub fn select_pixel_format<D: CameraDevice>(device: &mut D) -> Result<FourCC> {
    let current = device.format()?;
    if is_decodable(current.fourcc) {
        return Ok(current.fourcc);
    }

    for fourcc in DECODABLE_FOURCCS {
        let request = Format::new(current.width, current.height, fourcc);
        if let Err(err) = device.set_format(&request) {
            warn!(%fourcc, error = %err, "pixel format not supported");
            continue;
        }
        if device.format()?.fourcc == fourcc {
            info!(from = %current.fourcc, to = %fourcc, "switched pixel format");
            return Ok(fourcc);
        }
        debug!(%fourcc, "pixel format not accepted");
    }

    warn!(fourcc = %current.fourcc, "no decodable pixel format available");
    Ok(device.format()?.fourcc)
}

/// Try every candidate in order and return the resolution the device ends on.
///
/// A decodable pixel format is selected first. Failures for individual
/// candidates are logged and skipped. Only readbacks can fail this call.
pub fn negotiate_resolution<D: CameraDevice>(
    device: &mut D,
    candidates: &[Resolution],
) -> Result<Resolution> {
    select_pixel_format(device)?;

    for &candidate in candidates {
        match try_resolution(device, candidate) {
            Ok(_) => debug!(%candidate, "resolution accepted"),
            Err(err) => warn!(%candidate, error = %err, "resolution not supported"),
        }
    }

    let format = device.format()?;
    info!(
        resolution = %format.resolution(),
        fourcc = %format.fourcc,
        "negotiated capture format"
    );
    Ok(format.resolution())
}
