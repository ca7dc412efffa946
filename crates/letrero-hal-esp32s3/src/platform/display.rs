use embedded_hal::spi::SpiDevice;
use letrero_core::display::TextSurface;
use max7219::{Config, Error, FrameBuffer, Max7219};

use crate::render::text;

/// Top row of the text line; glyphs are as tall as the panel.
const TEXT_ROW: i32 = 0;

/// MAX7219 chain exposed as a one-line text surface.
///
/// Drawing goes to an in-memory frame; only `present` touches the bus.
#[derive(Debug)]
pub struct MatrixDisplay<SPI> {
    driver: Max7219<SPI>,
    frame: FrameBuffer,
}

impl<SPI> MatrixDisplay<SPI>
where
    SPI: SpiDevice<u8>,
{
    pub fn new(spi: SPI, config: Config) -> Self {
        Self {
            driver: Max7219::new(spi, config),
            frame: FrameBuffer::new(),
        }
    }

    /// Wakes the chain, applies intensity, and blanks every module.
    pub fn initialize(&mut self) -> Result<(), Error<SPI::Error>> {
        self.driver.initialize()?;
        self.driver.clear_all()
    }

    pub fn set_intensity(&mut self, intensity: u8) -> Result<(), Error<SPI::Error>> {
        self.driver.set_intensity(intensity)
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn release(self) -> SPI {
        self.driver.release()
    }
}

impl<SPI> TextSurface for MatrixDisplay<SPI>
where
    SPI: SpiDevice<u8>,
{
    type Error = Error<SPI::Error>;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.frame.clear(false);
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x_offset: i32) -> Result<(), Self::Error> {
        text::draw_text(&mut self.frame, text, x_offset, TEXT_ROW, true);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.driver.flush(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::spi::{ErrorKind, ErrorType, Operation};
    use letrero_core::scroll::render_frame;
    use max7219::protocol;

    use super::*;

    #[derive(Default)]
    struct BusLog {
        packets: Vec<Vec<u8>>,
        fail: bool,
    }

    impl ErrorType for BusLog {
        type Error = ErrorKind;
    }

    impl SpiDevice<u8> for BusLog {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in operations.iter() {
                if let Operation::Write(data) = op {
                    self.packets.push(data.to_vec());
                }
            }
            Ok(())
        }
    }

    #[test]
    fn initialize_blanks_all_digits_after_power_up() {
        let mut display = MatrixDisplay::new(BusLog::default(), Config::default());
        display.initialize().unwrap();

        let packets = display.release().packets;
        let init_writes = protocol::INIT_SEQUENCE.len() + 1;
        assert_eq!(packets.len(), init_writes + protocol::HEIGHT);
        assert!(
            packets[init_writes..]
                .iter()
                .all(|packet| packet.chunks(2).all(|pair| pair[1] == 0))
        );
    }

    #[test]
    fn drawing_stays_off_bus_until_present() {
        let mut display = MatrixDisplay::new(BusLog::default(), Config::default());

        display.clear().unwrap();
        display.draw_text("A", 0).unwrap();
        assert_eq!(display.frame().pixel(1, 1), Some(true));

        display.present().unwrap();
        assert_eq!(display.release().packets.len(), protocol::HEIGHT);
    }

    #[test]
    fn clear_wipes_previous_frame() {
        let mut display = MatrixDisplay::new(BusLog::default(), Config::default());

        render_frame(&mut display, "hola", 0).unwrap();
        render_frame(&mut display, "", 0).unwrap();

        assert_eq!(display.frame(), &FrameBuffer::new());
    }

    #[test]
    fn bus_failure_surfaces_on_present() {
        let bus = BusLog {
            fail: true,
            ..BusLog::default()
        };
        let mut display = MatrixDisplay::new(bus, Config::default());

        assert_eq!(display.draw_text("x", 0), Ok(()));
        assert_eq!(display.present(), Err(Error::Spi(ErrorKind::Other)));
    }
}
