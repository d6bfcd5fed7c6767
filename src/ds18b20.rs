//! Implementation for the DS18B20 temperature sensor.
//!
//! The sensor is reached with skip ROM, so it must be the only device on the bus.

use embedded_hal::blocking::delay::DelayUs;
use fugit::MillisDurationU32;

use crate::{
    onewire::{crc::check_crc8, BusLine, OneWire, Result},
    thermometer::Reading,
};

pub const CONVERT_T: u8 = 0x44;
pub const READ_SCRATCHPAD: u8 = 0xBE;

/// Worst case conversion time at the power-on resolution of 12 bits
pub const CONVERSION_TIME: MillisDurationU32 = MillisDurationU32::millis(750);

/// The sensor's 9 byte scratchpad, CRC checked
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scratchpad(pub [u8; 9]);

impl Scratchpad {
    pub fn reading(&self) -> Reading {
        Reading::from_le_bytes([self.0[0], self.0[1]])
    }

    /// Configuration register, holds the resolution
    pub fn config(&self) -> u8 {
        self.0[4]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Whether the sensor answered the reset starting the conversion
    pub present: bool,
    pub reading: Reading,
}

pub struct Ds18b20<L> {
    wire: OneWire<L>,
}

impl<L: BusLine> Ds18b20<L> {
    pub const fn new(wire: OneWire<L>) -> Self {
        Self { wire }
    }

    /// Starts a temperature conversion
    ///
    /// Returns whether the sensor answered the reset. Wait [`CONVERSION_TIME`] before calling
    /// [`Ds18b20::read_data`].
    pub fn start_measurement(&mut self, delay: &mut impl DelayUs<u32>) -> Result<bool, L::Error> {
        self.wire.send_command(CONVERT_T, delay)
    }

    /// Reads the two temperature bytes at the start of the scratchpad
    ///
    /// There's no CRC over just these two bytes, so a missing sensor reads as `0xFFFF`.
    pub fn read_data(&mut self, delay: &mut impl DelayUs<u32>) -> Result<Reading, L::Error> {
        self.wire.send_command(READ_SCRATCHPAD, delay)?;

        let mut buf = [0u8; 2];
        self.wire.read_bytes(&mut buf, delay)?;

        Ok(Reading::from_le_bytes(buf))
    }

    /// Reads the whole scratchpad and checks its CRC
    pub fn read_scratchpad(&mut self, delay: &mut impl DelayUs<u32>) -> Result<Scratchpad, L::Error> {
        self.wire.send_command(READ_SCRATCHPAD, delay)?;

        let mut buf = [0u8; 9];
        self.wire.read_bytes(&mut buf, delay)?;
        check_crc8(&buf)?;

        Ok(Scratchpad(buf))
    }

    /// Measures the temperature, busy-waiting through the conversion
    pub fn measure(&mut self, delay: &mut impl DelayUs<u32>) -> Result<Measurement, L::Error> {
        let present = self.start_measurement(delay)?;
        delay.delay_us(CONVERSION_TIME.to_micros());
        let reading = self.read_data(delay)?;

        Ok(Measurement { present, reading })
    }
}
