use max7219::FrameBuffer;

use super::font::{self, CELL_LEFT_PAD, CELL_WIDTH};

/// Draws `text` in fixed-width cells with its left edge at column `x`.
///
/// Pixels falling outside the frame are clipped, so `x` may be negative or
/// past the right edge.
pub fn draw_text(frame: &mut FrameBuffer, text: &str, x: i32, y: i32, on: bool) {
    let width = max7219::protocol::WIDTH as isize;
    let mut cell_x = x as isize;

    for c in text.chars() {
        if cell_x >= width {
            break;
        }
        if cell_x + CELL_WIDTH as isize > 0 {
            draw_glyph(frame, cell_x + CELL_LEFT_PAD as isize, y as isize, c, on);
        }
        cell_x += CELL_WIDTH as isize;
    }
}

fn draw_glyph(frame: &mut FrameBuffer, x: isize, y: isize, c: char, on: bool) {
    for (col, bits) in font::glyph(c).iter().enumerate() {
        for row in 0..8 {
            if (bits & (1 << row)) != 0 {
                let _ = frame.set_pixel_signed(x + col as isize, y + row, on);
            }
        }
    }
}
