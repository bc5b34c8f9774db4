//! Conversion of raw camera frames into RGB images.

use image::{ImageFormat, RgbImage};

use crate::traits::{CameraError, Format, FourCC, Frame, Result};

/// Pixel formats [`to_rgb`] can decode, in order of preference.
pub const DECODABLE_FOURCCS: [FourCC; 3] = [FourCC::YUYV, FourCC::MJPG, FourCC::RGB3];

/// Whether frames in `fourcc` can be decoded.
#[must_use]
pub fn is_decodable(fourcc: FourCC) -> bool {
    DECODABLE_FOURCCS.contains(&fourcc)
}

/// Decode a frame captured in `format` into an RGB image.
///
/// Supports packed YUYV, MJPEG and RGB3 frames.
pub fn to_rgb(frame: &Frame, format: &Format) -> Result<RgbImage> {
    match format.fourcc {
        FourCC::YUYV => yuyv_to_rgb(frame.payload(), format),
        FourCC::MJPG => mjpeg_to_rgb(frame.payload()),
        FourCC::RGB3 => rgb3_to_rgb(frame.payload(), format),
        other => Err(CameraError::UnsupportedPixelFormat(other)),
    }
}

fn yuyv_to_rgb(data: &[u8], format: &Format) -> Result<RgbImage> {
    let (width, height) = (format.width, format.height);
    let stride = (format.stride.max(width * 2)) as usize;
    let row_bytes = (width * 2) as usize;

    let needed = stride * height.saturating_sub(1) as usize + row_bytes;
    if height > 0 && data.len() < needed {
        return Err(CameraError::Decode(format!(
            "YUYV frame too small for {width}x{height}: {} < {needed} bytes",
            data.len()
        )));
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for row in data.chunks(stride).take(height as usize) {
        // YUYV format: [Y0 U Y1 V] repeats, each pair of pixels shares U and V
        for pair in row.get(..row_bytes).unwrap_or(row).chunks_exact(4) {
            if let [y0, u, y1, v] = *pair {
                let (r, g, b) = yuv_to_rgb(y0, u, v);
                rgb.extend_from_slice(&[r, g, b]);
                let (r, g, b) = yuv_to_rgb(y1, u, v);
                rgb.extend_from_slice(&[r, g, b]);
            }
        }
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| CameraError::Decode(format!("odd YUYV width {width}")))
}

fn mjpeg_to_rgb(data: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|err| CameraError::Decode(err.to_string()))?;
    Ok(image.to_rgb8())
}

fn rgb3_to_rgb(data: &[u8], format: &Format) -> Result<RgbImage> {
    let (width, height) = (format.width, format.height);
    let row_bytes = (width * 3) as usize;
    let stride = (format.stride as usize).max(row_bytes);

    let mut rgb = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        rgb.extend_from_slice(row.get(..row_bytes).unwrap_or(row));
    }

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        CameraError::Decode(format!(
            "RGB3 frame too small for {width}x{height}: {} bytes",
            data.len()
        ))
    })
}

/// Convert YUV values to RGB.
///
/// Uses the ITU-R BT.601 conversion formula.
///
/// # Arguments
///
/// * `y` - Luminance value (16-235 for studio range)
/// * `u` - Blue-difference chroma value (16-240)
/// * `v` - Red-difference chroma value (16-240)
///
/// # Returns
///
/// RGB tuple with values clamped to 0-255 range.
#[must_use]
#[allow(clippy::many_single_char_names)]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y_f = f32::from(y);
    let u_f = f32::from(u) - 128.0;
    let v_f = f32::from(v) - 128.0;

    let r = 1.402f32.mul_add(v_f, y_f);
    let g = 0.714_14f32.mul_add(-v_f, 0.344_14f32.mul_add(-u_f, y_f));
    let b = 1.772f32.mul_add(u_f, y_f);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamp = |val: f32| -> u8 { val.clamp(0.0, 255.0) as u8 };

    (clamp(r), clamp(g), clamp(b))
}
