//! Wire-level protocol helpers for a daisy-chained MAX7219 8x8 matrix.

/// Number of cascaded 8x8 modules on the chain.
pub const MODULES: usize = 4;
/// Matrix width in pixels.
pub const WIDTH: usize = MODULES * 8;
/// Matrix height in pixels.
pub const HEIGHT: usize = 8;
/// Number of bytes in one pixel row.
pub const ROW_BYTES: usize = WIDTH / 8;
/// Total framebuffer size in bytes.
pub const BUFFER_SIZE: usize = ROW_BYTES * HEIGHT;

/// Packet size for one chain-wide register write.
///
/// Layout: one `[register, value]` pair per module. The first pair is shifted
/// through to the module farthest from the controller.
pub const PACKET_SIZE: usize = MODULES * 2;

pub const REG_NOOP: u8 = 0x00;
pub const REG_DIGIT0: u8 = 0x01;
pub const REG_DECODE_MODE: u8 = 0x09;
pub const REG_INTENSITY: u8 = 0x0A;
pub const REG_SCAN_LIMIT: u8 = 0x0B;
pub const REG_SHUTDOWN: u8 = 0x0C;
pub const REG_DISPLAY_TEST: u8 = 0x0F;

/// Highest brightness step accepted by the intensity register.
pub const MAX_INTENSITY: u8 = 0x0F;

/// Register writes issued at power-up, before intensity is applied.
pub const INIT_SEQUENCE: [(u8, u8); 5] = [
    (REG_SHUTDOWN, 0x00),
    (REG_DISPLAY_TEST, 0x00),
    (REG_SCAN_LIMIT, 0x07),
    (REG_DECODE_MODE, 0x00),
    (REG_SHUTDOWN, 0x01),
];

/// Returns the digit register driving `row` (0..8).
///
/// Returns `None` for invalid rows.
#[inline]
pub fn digit_register(row: usize) -> Option<u8> {
    if row >= HEIGHT {
        return None;
    }

    Some(REG_DIGIT0 + row as u8)
}

/// Builds a packet writing the same value to one register on every module.
#[inline]
pub fn build_broadcast_packet(register: u8, value: u8) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    for pair in packet.chunks_exact_mut(2) {
        pair[0] = register;
        pair[1] = value;
    }
    packet
}

/// Builds a packet updating one digit row on every module.
///
/// `data[m]` lands in module `m`. Returns `None` when `row` is out of range.
#[inline]
pub fn build_row_packet(row: usize, data: &[u8; MODULES]) -> Option<[u8; PACKET_SIZE]> {
    let register = digit_register(row)?;

    let mut packet = [0u8; PACKET_SIZE];
    for (pair, value) in packet.chunks_exact_mut(2).zip(data.iter()) {
        pair[0] = register;
        pair[1] = *value;
    }

    Some(packet)
}
