//! Drawing surface abstraction the scroll run renders through.

use core::fmt::Debug;

/// One-line text surface backed by a physical display.
///
/// `clear` and `draw_text` only touch the in-memory frame; `present` pushes it
/// to the hardware.
pub trait TextSurface {
    type Error: Debug;

    fn clear(&mut self) -> Result<(), Self::Error>;
    /// Draws `text` with its left edge at column `x_offset` (may be negative).
    fn draw_text(&mut self, text: &str, x_offset: i32) -> Result<(), Self::Error>;
    fn present(&mut self) -> Result<(), Self::Error>;
}
