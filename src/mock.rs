//! Mock device, clock and preview for testing without hardware.

use crate::clock::Clock;
use crate::preview::{Preview, PreviewInput};
use crate::traits::{
    CameraControl, CameraDevice, CameraError, CaptureStream, DeviceCapabilities, Format, FourCC,
    Frame, FrameMetadata, Resolution, Result,
};
use chrono::{DateTime, Local, TimeZone};
use image::RgbImage;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Counters shared between a mock device and the test that created it.
///
/// The device is moved into the session, so tests observe it through this.
#[derive(Debug, Default)]
pub struct MockStats {
    /// Frames handed out by any stream of the device.
    pub frames_read: Cell<u32>,
    /// Number of times the device was dropped.
    pub releases: Cell<u32>,
    /// Every format requested through `set_format`.
    pub format_requests: RefCell<Vec<Resolution>>,
    /// Every control write, in order.
    pub control_writes: RefCell<Vec<(CameraControl, i64)>>,
}

/// Mock device for testing without hardware.
pub struct MockDevice {
    capabilities: DeviceCapabilities,
    format: Format,
    supported: Vec<Resolution>,
    rejected: Vec<Resolution>,
    pixel_formats: Vec<FourCC>,
    controls: HashMap<CameraControl, i64>,
    fail_after: Option<u32>,
    stats: Rc<MockStats>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Create a new mock device with default settings.
    ///
    /// Starts at 320x240 YUYV and honors 320x240 and 640x480 only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: DeviceCapabilities {
                driver: "mock".to_owned(),
                card: "Mock Camera".to_owned(),
                bus_info: "mock:0".to_owned(),
                can_capture: true,
                can_stream: true,
            },
            format: Format::new(320, 240, FourCC::YUYV),
            supported: vec![Resolution::new(320, 240), Resolution::new(640, 480)],
            rejected: Vec::new(),
            pixel_formats: vec![FourCC::YUYV, FourCC::MJPG],
            controls: HashMap::from([
                (CameraControl::Brightness, 0),
                (CameraControl::Contrast, 32),
            ]),
            fail_after: None,
            stats: Rc::default(),
        }
    }

    /// Set the format for this mock device.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Replace the set of resolutions the mock driver honors.
    #[must_use]
    pub fn with_supported(mut self, supported: Vec<Resolution>) -> Self {
        self.supported = supported;
        self
    }

    /// Make `set_format` fail outright for `resolution`.
    #[must_use]
    pub fn rejecting(mut self, resolution: Resolution) -> Self {
        self.rejected.push(resolution);
        self
    }

    /// Replace the set of pixel formats the mock driver honors.
    #[must_use]
    pub fn with_pixel_formats(mut self, pixel_formats: Vec<FourCC>) -> Self {
        self.pixel_formats = pixel_formats;
        self
    }

    /// Make every read after the first `frames` successful ones fail.
    #[must_use]
    pub const fn failing_after(mut self, frames: u32) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Remove a control so reads and writes of it fail.
    #[must_use]
    pub fn without_control(mut self, control: CameraControl) -> Self {
        self.controls.remove(&control);
        self
    }

    /// Shared counters for this device.
    #[must_use]
    pub fn stats(&self) -> Rc<MockStats> {
        Rc::clone(&self.stats)
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.stats.releases.set(self.stats.releases.get() + 1);
    }
}

impl CameraDevice for MockDevice {
    type Stream<'a> = MockStream<'a>;

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn format(&self) -> Result<Format> {
        Ok(self.format.clone())
    }

    fn set_format(&mut self, format: &Format) -> Result<Format> {
        let requested = format.resolution();
        self.stats.format_requests.borrow_mut().push(requested);

        if self.rejected.contains(&requested) {
            return Err(CameraError::StreamError(format!(
                "injected VIDIOC_S_FMT failure for {requested}"
            )));
        }

        // Like a driver without scaling: unknown sizes or pixel formats leave
        // the format alone
        if self.supported.contains(&requested) && self.pixel_formats.contains(&format.fourcc) {
            self.format = format.clone();
        }
        Ok(self.format.clone())
    }

    fn control(&self, control: CameraControl) -> Result<i64> {
        self.controls
            .get(&control)
            .copied()
            .ok_or_else(|| CameraError::ControlError {
                control,
                message: "not supported by mock".to_owned(),
            })
    }

    fn set_control(&mut self, control: CameraControl, value: i64) -> Result<()> {
        let slot = self
            .controls
            .get_mut(&control)
            .ok_or_else(|| CameraError::ControlError {
                control,
                message: "not supported by mock".to_owned(),
            })?;
        *slot = value;
        self.stats.control_writes.borrow_mut().push((control, value));
        Ok(())
    }

    fn create_stream(&mut self, _buffer_count: u32) -> Result<Self::Stream<'_>> {
        Ok(MockStream { device: self })
    }
}

/// Mock capture stream producing YUYV color bars.
pub struct MockStream<'a> {
    device: &'a mut MockDevice,
}

impl CaptureStream for MockStream<'_> {
    fn next_frame(&mut self) -> Result<Frame> {
        let stats = &self.device.stats;
        let seq = stats.frames_read.get();

        if self.device.fail_after.is_some_and(|limit| seq >= limit) {
            return Err(CameraError::StreamError(format!(
                "injected read failure at frame {seq}"
            )));
        }
        stats.frames_read.set(seq + 1);

        let format = &self.device.format;
        Ok(Frame {
            data: generate_color_bars(format),
            metadata: FrameMetadata {
                sequence: seq,
                timestamp: Duration::from_millis(u64::from(seq) * 33), // ~30fps
                bytes_used: format.size,
            },
        })
    }
}

/// Generate YUYV color bars: White, Yellow, Cyan, Green, Magenta, Red, Blue, Black.
pub fn generate_color_bars(format: &Format) -> Vec<u8> {
    const BARS: [(u8, u8, u8); 8] = [
        (235, 128, 128), // White
        (210, 16, 146),  // Yellow
        (170, 166, 16),  // Cyan
        (145, 54, 34),   // Green
        (106, 202, 222), // Magenta
        (81, 90, 240),   // Red
        (41, 240, 110),  // Blue
        (16, 128, 128),  // Black
    ];

    let bar_width = (format.width / 8).max(1);
    let mut row = Vec::with_capacity((format.width * 2) as usize);
    for x in (0..format.width).step_by(2) {
        let bar_idx = (x / bar_width).min(7) as usize;
        let (y_val, u_val, v_val) = BARS.get(bar_idx).copied().unwrap_or(BARS[7]);
        row.extend_from_slice(&[y_val, u_val, y_val, v_val]);
    }

    row.repeat(format.height as usize)
}

/// Clock that only moves when the code under test sleeps.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Duration>,
    wall_origin: DateTime<Local>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Clock at time zero, with wall time pinned to 2024-01-31 14:25:00.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            wall_origin: Local
                .with_ymd_and_hms(2024, 1, 31, 14, 25, 0)
                .earliest()
                .unwrap_or_else(Local::now),
        }
    }

    /// Move time forward without a sleep.
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now.get()
    }

    fn wall_time(&self) -> DateTime<Local> {
        let offset = chrono::Duration::from_std(self.now.get()).unwrap_or_default();
        self.wall_origin + offset
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// What a test preview observed.
#[derive(Debug, Default)]
pub struct PreviewLog {
    /// Dimensions of each shown image.
    pub shown: RefCell<Vec<(u32, u32)>>,
    /// Number of event polls between frames.
    pub polls: Cell<u32>,
    /// Whether the preview was dropped (window closed).
    pub closed: Cell<bool>,
}

/// Preview that records frames and requests quit after a set count.
pub struct MockPreview {
    quit_after: Option<usize>,
    log: Rc<PreviewLog>,
}

impl Default for MockPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPreview {
    /// Preview that never asks to stop.
    #[must_use]
    pub fn new() -> Self {
        Self {
            quit_after: None,
            log: Rc::default(),
        }
    }

    /// Simulate a `q` key press once `frames` frames have been shown.
    #[must_use]
    pub const fn quit_after(mut self, frames: usize) -> Self {
        self.quit_after = Some(frames);
        self
    }

    /// Shared record of what was shown.
    #[must_use]
    pub fn log(&self) -> Rc<PreviewLog> {
        Rc::clone(&self.log)
    }
}

impl Preview for MockPreview {
    fn show(&mut self, image: &RgbImage) -> Result<PreviewInput> {
        let mut shown = self.log.shown.borrow_mut();
        shown.push(image.dimensions());
        if self.quit_after.is_some_and(|limit| shown.len() >= limit) {
            return Ok(PreviewInput::Quit);
        }
        Ok(PreviewInput::Continue)
    }

    fn poll(&mut self) -> Result<PreviewInput> {
        self.log.polls.set(self.log.polls.get() + 1);
        Ok(PreviewInput::Continue)
    }
}

impl Drop for MockPreview {
    fn drop(&mut self) {
        self.log.closed.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_device_creation() {
        let device = MockDevice::new();
        assert_eq!(device.capabilities().driver, "mock");
        assert!(device.capabilities().can_capture);
        assert!(device.capabilities().can_stream);
    }

    #[test]
    fn test_mock_device_format() {
        let mut device = MockDevice::new();
        let format = device.format().expect("format should succeed");
        assert_eq!(format.resolution(), Resolution::new(320, 240));

        let new_format = Format::new(640, 480, FourCC::YUYV);
        let actual = device.set_format(&new_format).expect("set_format should succeed");
        assert_eq!(actual.resolution(), Resolution::new(640, 480));

        let unsupported = Format::new(1920, 1080, FourCC::YUYV);
        let actual = device.set_format(&unsupported).expect("set_format should succeed");
        assert_eq!(actual.resolution(), Resolution::new(640, 480));
    }

    #[test]
    fn test_mock_stream_capture() {
        let mut device = MockDevice::new();
        let mut stream = device.create_stream(4).expect("create_stream should succeed");

        let frame1 = stream.next_frame().expect("next_frame should succeed");
        assert_eq!(frame1.metadata.sequence, 0);
        assert_eq!(frame1.data.len(), 320 * 240 * 2);

        let frame2 = stream.next_frame().expect("next_frame should succeed");
        assert_eq!(frame2.metadata.sequence, 1);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mut device = MockDevice::new().failing_after(2);
        let stats = device.stats();
        let mut stream = device.create_stream(4).expect("create_stream should succeed");

        assert!(stream.next_frame().is_ok());
        assert!(stream.next_frame().is_ok());
        assert!(stream.next_frame().is_err());
        assert_eq!(stats.frames_read.get(), 2);
    }

    #[test]
    fn test_mock_release_counted_on_drop() {
        let device = MockDevice::new();
        let stats = device.stats();
        assert_eq!(stats.releases.get(), 0);
        drop(device);
        assert_eq!(stats.releases.get(), 1);
    }

    #[test]
    fn test_manual_clock_moves_on_sleep() {
        let clock = ManualClock::new();
        let start = clock.wall_time();
        clock.sleep(Duration::from_millis(1500));
        assert_eq!(clock.elapsed(), Duration::from_millis(1500));
        assert_eq!(
            clock.wall_time() - start,
            chrono::Duration::milliseconds(1500)
        );
    }

    #[test]
    fn test_color_bars_layout() {
        let format = Format::new(64, 4, FourCC::YUYV);
        let data = generate_color_bars(&format);
        assert_eq!(data.len(), 64 * 4 * 2);
        // First bar white, last bar black
        assert_eq!(data.first().copied(), Some(235));
        assert_eq!(data.get(63 * 2).copied(), Some(16));
    }
}
