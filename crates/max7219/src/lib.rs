#![cfg_attr(not(test), no_std)]

//! MAX7219 (cascaded 8x8 LED matrix) driver primitives.

mod framebuffer;
pub mod protocol;

pub use framebuffer::FrameBuffer;

use embedded_hal::spi::SpiDevice;

/// How the 8x8 modules are mounted relative to the digit lines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    /// Digit registers drive pixel rows.
    Normal,
    /// Digit registers drive pixel columns (modules turned 90 degrees).
    Rotated,
}

/// Driver configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Expected SPI clock in Hz (documented for board glue).
    pub spi_hz: u32,
    /// Brightness step, 0..=15.
    pub intensity: u8,
    /// Module mounting.
    pub orientation: Orientation,
}

impl Config {
    pub const fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }

    pub const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub const fn with_spi_hz(mut self, spi_hz: u32) -> Self {
        self.spi_hz = spi_hz;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spi_hz: 10_000_000,
            intensity: 1,
            orientation: Orientation::Normal,
        }
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<SpiErr> {
    /// SPI transaction failed.
    Spi(SpiErr),
    /// Input parameters are outside supported bounds.
    InvalidInput,
}

pub type DriverResult<SpiErr> = Result<(), Error<SpiErr>>;

/// MAX7219 chain driver.
///
/// Chip select is owned by the `SpiDevice`; every register write is one
/// transaction covering the whole chain.
#[derive(Debug)]
pub struct Max7219<SPI> {
    spi: SPI,
    config: Config,
}

impl<SPI> Max7219<SPI>
where
    SPI: SpiDevice<u8>,
{
    /// Creates a new driver instance.
    pub fn new(spi: SPI, config: Config) -> Self {
        Self { spi, config }
    }

    /// Returns current configuration.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Releases owned bus.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Runs the power-up register sequence and applies the configured intensity.
    pub fn initialize(&mut self) -> DriverResult<SPI::Error> {
        for (register, value) in protocol::INIT_SEQUENCE {
            self.write_register(register, value)?;
        }

        self.set_intensity(self.config.intensity)
    }

    /// Sets brightness on every module.
    pub fn set_intensity(&mut self, intensity: u8) -> DriverResult<SPI::Error> {
        if intensity > protocol::MAX_INTENSITY {
            return Err(Error::InvalidInput);
        }

        self.config.intensity = intensity;
        self.write_register(protocol::REG_INTENSITY, intensity)
    }

    /// Enters (`true`) or leaves (`false`) low-power shutdown.
    pub fn set_shutdown(&mut self, shutdown: bool) -> DriverResult<SPI::Error> {
        self.write_register(protocol::REG_SHUTDOWN, if shutdown { 0x00 } else { 0x01 })
    }

    /// Blanks every digit register.
    pub fn clear_all(&mut self) -> DriverResult<SPI::Error> {
        for row in 0..protocol::HEIGHT {
            let register = protocol::digit_register(row).ok_or(Error::InvalidInput)?;
            self.write_register(register, 0x00)?;
        }

        Ok(())
    }

    /// Writes one digit row (0..8) across the chain.
    pub fn write_row(
        &mut self,
        row: usize,
        data: &[u8; protocol::MODULES],
    ) -> DriverResult<SPI::Error> {
        let packet = protocol::build_row_packet(row, data).ok_or(Error::InvalidInput)?;
        self.spi.write(&packet).map_err(Error::Spi)
    }

    /// Flushes a full framebuffer, one transaction per digit row.
    pub fn flush(&mut self, frame: &FrameBuffer) -> DriverResult<SPI::Error> {
        for row in 0..protocol::HEIGHT {
            let data = frame
                .digit_row(row, self.config.orientation)
                .ok_or(Error::InvalidInput)?;
            self.write_row(row, &data)?;
        }

        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) -> DriverResult<SPI::Error> {
        let packet = protocol::build_broadcast_packet(register, value);
        self.spi.write(&packet).map_err(Error::Spi)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

    use super::*;

    #[derive(Default)]
    struct RecordingSpi {
        writes: Vec<Vec<u8>>,
    }

    impl ErrorType for RecordingSpi {
        type Error = Infallible;
    }

    impl SpiDevice<u8> for RecordingSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            let mut bytes = Vec::new();
            for op in operations.iter() {
                if let Operation::Write(data) = op {
                    bytes.extend_from_slice(data);
                }
            }
            self.writes.push(bytes);
            Ok(())
        }
    }

    #[test]
    fn initialize_sends_power_up_sequence_then_intensity() {
        let config = Config::default().with_intensity(4);
        let mut driver = Max7219::new(RecordingSpi::default(), config);
        driver.initialize().unwrap();

        let registers: Vec<(u8, u8)> = driver
            .release()
            .writes
            .iter()
            .map(|packet| (packet[0], packet[1]))
            .collect();
        assert_eq!(
            registers,
            [
                (protocol::REG_SHUTDOWN, 0x00),
                (protocol::REG_DISPLAY_TEST, 0x00),
                (protocol::REG_SCAN_LIMIT, 0x07),
                (protocol::REG_DECODE_MODE, 0x00),
                (protocol::REG_SHUTDOWN, 0x01),
                (protocol::REG_INTENSITY, 0x04),
            ]
        );
    }

    #[test]
    fn out_of_range_intensity_is_rejected_without_bus_traffic() {
        let mut driver = Max7219::new(RecordingSpi::default(), Config::default());

        assert_eq!(driver.set_intensity(16), Err(Error::InvalidInput));
        assert!(driver.release().writes.is_empty());
    }

    #[test]
    fn flush_writes_one_packet_per_digit_row() {
        let mut frame = FrameBuffer::new();
        frame.set_pixel(0, 7, true);

        let mut driver = Max7219::new(RecordingSpi::default(), Config::default());
        driver.flush(&frame).unwrap();

        let writes = driver.release().writes;
        assert_eq!(writes.len(), protocol::HEIGHT);
        assert!(writes.iter().all(|packet| packet.len() == protocol::PACKET_SIZE));
        assert_eq!(writes[7][0], 0x08);
        assert_eq!(writes[7][1], 0b1000_0000);
        assert_eq!(writes[0][1], 0x00);
    }
}
