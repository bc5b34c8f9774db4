//! Timestamp annotation for preview frames.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

/// Left margin of the annotation in pixels.
const MARGIN_X: u32 = 10;
/// Distance from the bottom edge to the text baseline.
const BASELINE_FROM_BOTTOM: u32 = 20;
/// Glyph cell size of the bitmap font.
const GLYPH_SIZE: u32 = 8;

/// Annotation color.
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Glyph scale for an image of the given height: 1 up to 480 lines, then
/// one step per 480 lines.
#[must_use]
pub fn text_scale(height: u32) -> u32 {
    (height / 480).max(1)
}

/// Draw `text` in the bottom-left corner of `image`.
///
/// Pixels falling outside the image are clipped.
pub fn annotate(image: &mut RgbImage, text: &str) {
    let scale = text_scale(image.height());
    let glyph_height = GLYPH_SIZE * scale;
    let top = image
        .height()
        .saturating_sub(BASELINE_FROM_BOTTOM)
        .saturating_sub(glyph_height);

    draw_text(image, text, MARGIN_X, top, scale, TEXT_COLOR);
}

/// Draw `text` with its top-left corner at (`x`, `y`).
pub fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let advance = GLYPH_SIZE * scale;
    let mut cursor = x;

    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            draw_glyph(image, &glyph, cursor, y, scale, color);
        }
        cursor = cursor.saturating_add(advance);
        if cursor >= image.width() {
            break;
        }
    }
}

fn draw_glyph(image: &mut RgbImage, glyph: &[u8; 8], x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    for (row, bits) in (0u32..).zip(glyph.iter()) {
        for col in 0..GLYPH_SIZE {
            // Bit 0 is the leftmost column
            if bits & (1u8 << col) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + col * scale + dx;
                    let py = y + row * scale + dy;
                    if let Some(pixel) = image.get_pixel_mut_checked(px, py) {
                        *pixel = color;
                    }
                }
            }
        }
    }
}
