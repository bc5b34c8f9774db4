//! Core traits and types for the camera abstraction.

use std::fmt;
use std::time::Duration;

/// Pixel format representation (e.g., YUYV, MJPG, RGB3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed).
    pub const YUYV: Self = Self::new(b"YUYV");
    /// MJPEG pixel format (Motion JPEG).
    pub const MJPG: Self = Self::new(b"MJPG");
    /// RGB3 pixel format (24-bit RGB).
    pub const RGB3: Self = Self::new(b"RGB3");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resolution {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Video format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub fourcc: FourCC,
    /// Bytes per line (stride).
    pub stride: u32,
    /// Total frame size in bytes.
    pub size: u32,
}

impl Format {
    /// Create a new format specification.
    ///
    /// Stride and size are estimates for packed formats; drivers report the
    /// real values when the format is applied.
    #[must_use]
    pub const fn new(width: u32, height: u32, fourcc: FourCC) -> Self {
        let bytes_per_pixel = if fourcc.0[0] == b'R' { 3 } else { 2 };
        let stride = width * bytes_per_pixel;
        let size = stride * height;
        Self {
            width,
            height,
            fourcc,
            stride,
            size,
        }
    }

    /// The same pixel format at a different resolution.
    #[must_use]
    pub const fn with_resolution(&self, resolution: Resolution) -> Self {
        Self::new(resolution.width, resolution.height, self.fourcc)
    }

    /// Width and height of this format.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Device capability flags.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

/// Image controls the capture session adjusts before warmup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraControl {
    /// Image brightness.
    Brightness,
    /// Image contrast.
    Contrast,
}

impl CameraControl {
    /// V4L2 user-class control id (`V4L2_CID_BRIGHTNESS`, `V4L2_CID_CONTRAST`).
    #[must_use]
    pub const fn v4l2_id(self) -> u32 {
        const V4L2_CID_BASE: u32 = 0x0098_0900;
        match self {
            Self::Brightness => V4L2_CID_BASE,
            Self::Contrast => V4L2_CID_BASE + 1,
        }
    }

    /// Lowercase name used in log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
        }
    }
}

impl fmt::Display for CameraControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata for a captured frame.
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    /// Driver frame sequence number.
    pub sequence: u32,
    /// Capture timestamp.
    pub timestamp: Duration,
    /// Actual bytes used in the frame buffer.
    pub bytes_used: u32,
}

/// A captured video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw frame data.
    pub data: Vec<u8>,
    /// Frame metadata.
    pub metadata: FrameMetadata,
}

impl Frame {
    /// The bytes the driver actually filled.
    ///
    /// Falls back to the whole buffer when `bytes_used` is zero or out of range.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match usize::try_from(self.metadata.bytes_used) {
            Ok(used) if used > 0 => self.data.get(..used).unwrap_or(&self.data),
            _ => &self.data,
        }
    }
}

/// Error type for camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// Device with given index was not found.
    #[error("Device {0} not found")]
    DeviceNotFound(u32),
    /// Failed to open device.
    #[error("Failed to open device: {0}")]
    DeviceOpenFailed(String),
    /// The driver did not honor a requested resolution.
    #[error("Resolution not supported: requested {requested}, actual {actual}")]
    FormatNotSupported {
        /// Resolution that was asked for.
        requested: Resolution,
        /// Resolution the device reported afterwards.
        actual: Resolution,
    },
    /// Reading or writing an image control failed.
    #[error("Control {control} failed: {message}")]
    ControlError {
        /// The control being accessed.
        control: CameraControl,
        /// Driver error text.
        message: String,
    },
    /// Error during streaming operation.
    #[error("Stream error: {0}")]
    StreamError(String),
    /// Frames arrive in a pixel format the decoder does not handle.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(FourCC),
    /// Frame data could not be turned into an image.
    #[error("Failed to decode frame: {0}")]
    Decode(String),
    /// JPEG encoding failed.
    #[error("Failed to encode image")]
    Encode(#[from] image::ImageError),
    /// Preview window failure.
    #[error("Preview error: {0}")]
    Preview(String),
    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Abstraction over camera device operations.
pub trait CameraDevice {
    /// The stream type returned by `create_stream`.
    type Stream<'a>: CaptureStream
    where
        Self: 'a;

    /// Get device capabilities.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Get current format.
    fn format(&self) -> Result<Format>;

    /// Set capture format. Returns the format reported by the driver.
    fn set_format(&mut self, format: &Format) -> Result<Format>;

    /// Read the current value of an image control.
    fn control(&self, control: CameraControl) -> Result<i64>;

    /// Write an image control.
    fn set_control(&mut self, control: CameraControl, value: i64) -> Result<()>;

    /// Create a capture stream with the specified number of buffers.
    fn create_stream(&mut self, buffer_count: u32) -> Result<Self::Stream<'_>>;
}

/// Abstraction over capture stream operations.
pub trait CaptureStream {
    /// Capture the next frame from the stream.
    fn next_frame(&mut self) -> Result<Frame>;
}
