//! Timelapse-Capture: fixed-rate frame capture from a V4L2 USB camera
//!
//! A capture session negotiates the largest standard resolution the camera
//! honors, discards a few warmup frames, then samples the camera at a target
//! rate for a bounded duration, writing timestamped JPEGs and/or showing an
//! annotated live preview. Trait-based device and clock abstractions allow
//! the whole loop to run against mock devices in tests.

pub mod clock;
pub mod config;
pub mod decode;
pub mod device;
pub mod negotiate;
pub mod overlay;
pub mod preview;
pub mod session;
pub mod stamp;
pub mod storage;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use clock::{Clock, SystemClock};
pub use config::{Args, CaptureConfig, ConfigError};
pub use device::V4L2Device;
pub use session::{Session, SessionState, SessionSummary, StopReason};
pub use traits::{
    CameraControl, CameraDevice, CameraError, CaptureStream, DeviceCapabilities, Format, FourCC,
    Frame, FrameMetadata, Resolution,
};
