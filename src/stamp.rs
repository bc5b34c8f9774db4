//! Timestamp strings for frames and session directories.
//!
//! Frame stamps look like `240131_142501_004512_0000007`: date, time,
//! microseconds and a 7-digit zero-padded sequence number. Because every
//! field is fixed-width, stamps sort lexicographically in capture order.

use chrono::{DateTime, Local};
use std::fmt;

/// `strftime` pattern for the per-session directory suffix.
const SESSION_FORMAT: &str = "%y%m%d_%H%M%S";
/// `strftime` pattern for the time part of a frame stamp.
const FRAME_FORMAT: &str = "%y%m%d_%H%M%S_%6f";

/// Prefix of the per-session output directory.
pub const SESSION_DIR_PREFIX: &str = "timelapse_";

/// Extension of saved frames.
pub const FRAME_EXTENSION: &str = "jpg";

/// Identity of one captured frame: acquisition time plus sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStamp {
    /// Wall-clock time the frame was acquired.
    pub time: DateTime<Local>,
    /// Position of the frame within the session, starting at 0.
    pub sequence: u32,
}

impl FrameStamp {
    /// Stamp for frame `sequence` taken at `time`.
    #[must_use]
    pub const fn new(time: DateTime<Local>, sequence: u32) -> Self {
        Self { time, sequence }
    }

    /// File name this frame is saved under.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{self}.{FRAME_EXTENSION}")
    }
}

impl fmt::Display for FrameStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{:07}",
            self.time.format(FRAME_FORMAT),
            self.sequence
        )
    }
}

/// Directory name for a session started at `start`.
#[must_use]
pub fn session_dir_name(start: &DateTime<Local>) -> String {
    format!("{SESSION_DIR_PREFIX}{}", start.format(SESSION_FORMAT))
}

/// Recover the sequence number from a saved frame's file name.
#[must_use]
pub fn parse_sequence(file_name: &str) -> Option<u32> {
    let stem = file_name.strip_suffix(FRAME_EXTENSION)?.strip_suffix('.')?;
    let (_, digits) = stem.rsplit_once('_')?;
    if digits.len() != 7 {
        return None;
    }
    digits.parse().ok()
}
