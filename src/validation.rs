//! Consistency checks over a session output directory.
//!
//! Useful after a run (or in integration tests) to confirm that every frame
//! landed on disk and that the files sort in capture order.

use std::fs;
use std::path::Path;

use crate::stamp::{parse_sequence, FRAME_EXTENSION};
use crate::traits::{CameraError, Result};

/// Validates the frames saved in a session directory.
///
/// Frame files sorted by name must carry the sequence numbers 0, 1, 2, ...
/// with no gaps and no repeats. Files with other extensions are ignored.
///
/// # Returns
///
/// The number of frames found.
///
/// # Errors
///
/// Returns `StreamError` if:
/// - The directory contains no frames
/// - A frame file name has no sequence number
/// - Any sequence number doesn't follow the previous one by exactly 1
pub fn validate_session_dir(dir: &Path) -> Result<usize> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if Path::new(&name)
            .extension()
            .is_some_and(|ext| ext == FRAME_EXTENSION)
        {
            names.push(name);
        }
    }

    if names.is_empty() {
        return Err(CameraError::StreamError(format!(
            "No frames in {}",
            dir.display()
        )));
    }
    names.sort();

    for (expected, name) in (0u32..).zip(names.iter()) {
        let sequence = parse_sequence(name).ok_or_else(|| {
            CameraError::StreamError(format!("Frame file without sequence number: {name}"))
        })?;

        if sequence != expected {
            return Err(CameraError::StreamError(format!(
                "Frame sequence gap at {name}: expected {expected}, got {sequence}"
            )));
        }
    }

    Ok(names.len())
}
