//! TM1638 LED driver board (8 seven-segment digits) over SPI.
//!
//! The TM1638 shifts data in least significant bit first. SPI peripherals are assumed to send the most
//! significant bit first, so every byte is mirrored before it goes out.

use embedded_hal::{
    blocking::{delay::DelayUs, spi::Write},
    digital::v2::OutputPin,
};

use super::{DisplaySink, Glyph, DIGITS};
use crate::onewire::bit_reverse;

/// Write data to consecutive addresses
const CMD_WRITE_INCREMENT: u8 = 0x40;
/// Write data to a single address
const CMD_WRITE_FIXED: u8 = 0x44;
const CMD_DISPLAY_OFF: u8 = 0x80;
/// Display on, brightness in the low 3 bits
const CMD_DISPLAY_ON: u8 = 0x88;
/// First display register. Digits and LEDs alternate from here.
const ADDR_START: u8 = 0xC0;
/// Register of the rightmost digit. Digits to its left are two addresses lower each.
const ADDR_DIGIT_0: u8 = 0xCE;
/// Number of display registers
const REGISTERS: usize = 16;

/// Minimum strobe high time between commands
const STROBE_US: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<S, P> {
    Spi(S),
    Pin(P),
    /// Digit position past the end of the display
    Position,
}

impl<S, P> Error<S, P> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Error::Spi(_) => "SPI error",
            Error::Pin(_) => "Strobe pin error",
            Error::Position => "Digit position out of range",
        }
    }
}

pub struct Tm1638<SPI, STB, D> {
    spi: SPI,
    stb: STB,
    delay: D,
}

impl<SPI, STB, D, S, P> Tm1638<SPI, STB, D>
where
    SPI: Write<u8, Error = S>,
    STB: OutputPin<Error = P>,
    D: DelayUs<u32>,
{
    /// Takes the bus and deselects the chip
    pub fn new(spi: SPI, mut stb: STB, delay: D) -> Result<Self, Error<S, P>> {
        stb.set_high().map_err(Error::Pin)?;
        Ok(Self { spi, stb, delay })
    }

    /// Sends `bytes` in a single strobe frame
    fn frame(&mut self, bytes: &[u8]) -> Result<(), Error<S, P>> {
        self.stb.set_low().map_err(Error::Pin)?;
        for byte in bytes {
            self.spi.write(&[bit_reverse(*byte)]).map_err(Error::Spi)?;
        }
        self.stb.set_high().map_err(Error::Pin)?;
        self.delay.delay_us(STROBE_US);
        Ok(())
    }

    /// Write `data` to a single display register
    pub fn write_to(&mut self, address: u8, data: u8) -> Result<(), Error<S, P>> {
        self.frame(&[CMD_WRITE_FIXED])?;
        self.frame(&[address, data])
    }

    /// Blanks every digit and LED
    pub fn clear(&mut self) -> Result<(), Error<S, P>> {
        self.frame(&[CMD_WRITE_INCREMENT])?;

        let mut buf = [0u8; REGISTERS + 1];
        buf[0] = ADDR_START;
        self.frame(&buf)
    }

    /// Turns the display on at `level` (0-7). 0 is the dimmest setting, not off.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), Error<S, P>> {
        self.frame(&[CMD_DISPLAY_ON | (level & 0x07)])
    }

    /// Turns the display off, keeping its contents
    pub fn off(&mut self) -> Result<(), Error<S, P>> {
        self.frame(&[CMD_DISPLAY_OFF])
    }
}

impl<SPI, STB, D, S, P> DisplaySink for Tm1638<SPI, STB, D>
where
    SPI: Write<u8, Error = S>,
    STB: OutputPin<Error = P>,
    D: DelayUs<u32>,
{
    type Error = Error<S, P>;

    fn put(&mut self, position: u8, glyph: Glyph) -> Result<(), Self::Error> {
        if usize::from(position) >= DIGITS {
            return Err(Error::Position);
        }
        self.write_to(ADDR_DIGIT_0 - 2 * position, glyph.bits())
    }
}
