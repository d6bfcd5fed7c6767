//! Temperature readings and unit conversion

use fixed::types::I28F4;

/// I28F4 is a fixed point number with 4 fractional bits and 28 integer bits.
/// This gives us a precision of 0.0625 degrees Celsius & a range of (-2^27, 2^27 - 0.0625).
pub type Temperature = I28F4;

/// The raw temperature register of the sensor, two's complement in 1/16 degrees Celsius.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading(pub i16);

impl Reading {
    /// Builds a reading from the register bytes in bus order, low byte first
    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(i16::from_le_bytes(bytes))
    }

    pub fn temperature(self) -> Temperature {
        Temperature::from_bits(i32::from(self.0))
    }

    /// The reading in tenths of a degree of `unit`, rounded half up on the magnitude
    pub fn tenths(self, unit: Unit) -> Tenths {
        let temp = self.temperature();

        // Both scalings are exact in 4 fractional bits
        let scaled = match unit {
            Unit::Celsius => temp * 10,
            Unit::Fahrenheit => temp * 18 + Temperature::const_from_int(320),
        };

        let magnitude = scaled.unsigned_abs().round().saturating_to_num::<u16>();
        Tenths {
            magnitude,
            negative: scaled.is_negative() && magnitude != 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    Celsius,
    Fahrenheit,
}

/// A signed value split into sign and magnitude, one decimal digit of precision as an integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tenths {
    pub magnitude: u16,
    pub negative: bool,
}
