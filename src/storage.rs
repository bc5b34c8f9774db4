//! Session output directory and JPEG frame writer.

use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::stamp::{session_dir_name, FrameStamp};
use crate::traits::Result;

/// Writes the frames of one session into its own directory.
#[derive(Debug)]
pub struct FrameWriter {
    dir: PathBuf,
    quality: u8,
}

impl FrameWriter {
    /// Create `<parent>/timelapse_<start>` and write frames into it.
    ///
    /// `parent` is created if missing. Fails if the session directory
    /// already exists, so two sessions never share a directory.
    pub fn create(parent: &Path, start: &DateTime<Local>, quality: u8) -> Result<Self> {
        fs::create_dir_all(parent)?;
        let dir = parent.join(session_dir_name(start));
        fs::create_dir(&dir)?;

        info!(dir = %dir.display(), "created session directory");
        Ok(Self { dir, quality })
    }

    /// The session directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encode `image` as JPEG and write it under the stamp's file name.
    pub fn write(&self, image: &RgbImage, stamp: &FrameStamp) -> Result<PathBuf> {
        let path = self.dir.join(stamp.file_name());
        let mut writer = BufWriter::new(File::create(&path)?);

        JpegEncoder::new_with_quality(&mut writer, self.quality).encode_image(image)?;
        writer.into_inner().map_err(|err| err.into_error())?;

        debug!(path = %path.display(), "saved frame");
        Ok(path)
    }
}
