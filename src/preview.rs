//! Live preview of captured frames.

use image::RgbImage;

use crate::traits::Result;

/// What the operator asked for while a frame was on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewInput {
    /// Keep capturing.
    Continue,
    /// Escape, `q`, or the window was closed.
    Quit,
}

/// An on-screen sink for annotated frames.
///
/// Dropping the preview closes its window.
pub trait Preview {
    /// Display `image` and poll for a key press.
    fn show(&mut self, image: &RgbImage) -> Result<PreviewInput>;

    /// Process window events without a new frame.
    fn poll(&mut self) -> Result<PreviewInput>;
}

/// Pack RGB pixels as `0x00RRGGBB` words.
#[must_use]
pub fn to_argb_words(image: &RgbImage) -> Vec<u32> {
    image
        .pixels()
        .map(|pixel| {
            let [r, g, b] = pixel.0;
            (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
        })
        .collect()
}

#[cfg(feature = "preview")]
pub use window::WindowPreview;

#[cfg(feature = "preview")]
mod window {
    use super::{to_argb_words, Preview, PreviewInput};
    use crate::traits::{CameraError, Resolution, Result};
    use image::RgbImage;
    use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};
    use tracing::debug;

    /// Resizable desktop window backed by minifb.
    pub struct WindowPreview {
        window: Window,
        buffer: Vec<u32>,
    }

    impl WindowPreview {
        /// Open a window titled `title`, initially sized to `resolution`.
        pub fn open(title: &str, resolution: Resolution) -> Result<Self> {
            let options = WindowOptions {
                resize: true,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            };
            let window = Window::new(
                title,
                resolution.width as usize,
                resolution.height as usize,
                options,
            )
            .map_err(|err| CameraError::Preview(err.to_string()))?;

            debug!(title, %resolution, "opened preview window");
            Ok(Self {
                window,
                buffer: Vec::new(),
            })
        }

        fn input(&self) -> PreviewInput {
            let quit_key = self
                .window
                .get_keys_pressed(KeyRepeat::No)
                .iter()
                .any(|key| matches!(key, Key::Escape | Key::Q));

            if quit_key || !self.window.is_open() {
                PreviewInput::Quit
            } else {
                PreviewInput::Continue
            }
        }
    }

    impl Preview for WindowPreview {
        fn show(&mut self, image: &RgbImage) -> Result<PreviewInput> {
            self.buffer = to_argb_words(image);
            self.window
                .update_with_buffer(
                    &self.buffer,
                    image.width() as usize,
                    image.height() as usize,
                )
                .map_err(|err| CameraError::Preview(err.to_string()))?;
            Ok(self.input())
        }

        fn poll(&mut self) -> Result<PreviewInput> {
            self.window.update();
            Ok(self.input())
        }
    }

    impl Drop for WindowPreview {
        fn drop(&mut self) {
            debug!("closing preview window");
        }
    }
}
