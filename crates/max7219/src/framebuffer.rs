//! In-memory framebuffer for the MAX7219 matrix.

use crate::{
    Orientation,
    protocol::{BUFFER_SIZE, HEIGHT, MODULES, ROW_BYTES, WIDTH},
};

/// 1bpp framebuffer for the whole chain.
///
/// Bit mapping within one row byte: bit 7 is the leftmost pixel in that byte.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameBuffer {
    bytes: [u8; BUFFER_SIZE],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Creates a new blank framebuffer.
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; BUFFER_SIZE],
        }
    }

    /// Returns the underlying framebuffer bytes.
    pub fn bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.bytes
    }

    /// Clears every LED off (`on = false`) or lit (`on = true`).
    pub fn clear(&mut self, on: bool) {
        self.bytes.fill(if on { 0xFF } else { 0x00 });
    }

    /// Sets a pixel state.
    ///
    /// Returns `true` when pixel is in bounds, `false` otherwise.
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }

        let byte_index = y * ROW_BYTES + (x / 8);
        let bit_mask = 1u8 << (7 - (x % 8));

        if on {
            self.bytes[byte_index] |= bit_mask;
        } else {
            self.bytes[byte_index] &= !bit_mask;
        }

        true
    }

    /// Sets a pixel addressed with signed coordinates, clipping off-surface ones.
    pub fn set_pixel_signed(&mut self, x: isize, y: isize, on: bool) -> bool {
        if x < 0 || y < 0 {
            return false;
        }

        self.set_pixel(x as usize, y as usize, on)
    }

    /// Reads a pixel state.
    pub fn pixel(&self, x: usize, y: usize) -> Option<bool> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }

        let byte_index = y * ROW_BYTES + (x / 8);
        let bit_mask = 1u8 << (7 - (x % 8));
        Some((self.bytes[byte_index] & bit_mask) != 0)
    }

    /// Returns the value each module needs in digit register `row` (0..8).
    ///
    /// With [`Orientation::Rotated`] the modules are mounted a quarter turn off,
    /// so digit `d` carries pixel column `d` of the module with the top row in
    /// bit 7.
    pub fn digit_row(&self, row: usize, orientation: Orientation) -> Option<[u8; MODULES]> {
        if row >= HEIGHT {
            return None;
        }

        let mut data = [0u8; MODULES];
        match orientation {
            Orientation::Normal => {
                let start = row * ROW_BYTES;
                data.copy_from_slice(&self.bytes[start..start + ROW_BYTES]);
            }
            Orientation::Rotated => {
                for (module, value) in data.iter_mut().enumerate() {
                    let x = module * 8 + row;
                    for y in 0..HEIGHT {
                        if self.pixel(x, y) == Some(true) {
                            *value |= 1 << (7 - y);
                        }
                    }
                }
            }
        }

        Some(data)
    }
}
