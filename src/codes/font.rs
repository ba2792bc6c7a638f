//! Human-readable caption under a barcode, drawn with the Spleen 6×12 bitmap
//! font.

use image::{GrayImage, Luma};
use spleen_font::{FONT_6X12, PSF2Font};

pub const GLYPH_WIDTH: u32 = 6;
pub const GLYPH_HEIGHT: u32 = 12;

/// Pixel width of `text` set in 6×12.
pub fn text_width(text: &str) -> u32 {
    (text.chars().count() as u32).saturating_mul(GLYPH_WIDTH)
}

/// Draw `text` in black, horizontally centred on the image, top edge at `top`.
///
/// Characters without a glyph are skipped but still advance the pen. Pixels
/// falling outside the image are dropped.
pub fn draw_caption(img: &mut GrayImage, text: &str, top: u32) {
    let Ok(mut font) = PSF2Font::new(FONT_6X12) else {
        return;
    };

    let start_x = img.width().saturating_sub(text_width(text)) / 2;
    let mut buf = [0u8; 4];

    for (i, ch) in text.chars().enumerate() {
        let pen_x = start_x + i as u32 * GLYPH_WIDTH;
        let Some(glyph) = font.glyph_for_utf8(ch.encode_utf8(&mut buf).as_bytes()) else {
            continue;
        };
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if !on {
                    continue;
                }
                let x = pen_x + col_x as u32;
                let y = top + row_y as u32;
                if x < img.width() && y < img.height() {
                    img.put_pixel(x, y, Luma([0]));
                }
            }
        }
    }
}
