//! Bit-banged 1-Wire bus master.
//!
//! All timing is done with blocking delays. Slots have no timeout, so a device that holds the line low
//! forever hangs the caller.

pub mod commands;
pub mod crc;
mod error;
mod line;
#[cfg(test)]
pub(crate) mod sim;

use embedded_hal::blocking::delay::DelayUs;
use fugit::MicrosDurationU32;

pub use self::{
    error::*,
    line::{BusLine, OpenDrainPin},
};

/// Low time of a write-1 slot. Must be released before the device samples at 15us.
const WRITE_ONE_LOW_US: u32 = 14;
/// Released time of a write-1 slot
const WRITE_ONE_RELEASE_US: u32 = 47;
/// Low time of a write-0 slot
const WRITE_ZERO_LOW_US: u32 = 60;
/// Recovery time after a write-0 slot
const WRITE_ZERO_RELEASE_US: u32 = 1;
/// Low pulse starting a read slot
const READ_INIT_US: u32 = 1;
/// Time from releasing the line to sampling it
const READ_SAMPLE_US: u32 = 13;
/// Remainder of the read slot plus recovery
const READ_RECOVERY_US: u32 = 47;

/// Duration of every bit slot, read or write
pub const SLOT_US: u32 = 61;

static_assertions::const_assert_eq!(WRITE_ONE_LOW_US + WRITE_ONE_RELEASE_US, SLOT_US);
static_assertions::const_assert_eq!(WRITE_ZERO_LOW_US + WRITE_ZERO_RELEASE_US, SLOT_US);
static_assertions::const_assert_eq!(READ_INIT_US + READ_SAMPLE_US + READ_RECOVERY_US, SLOT_US);

/// Timing of the reset/presence handshake.
///
/// The defaults work with DS18B20 parts; check the datasheet of anything else before relying on them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetTiming {
    /// How long the line is held low. At least 480us.
    pub pulse: MicrosDurationU32,
    /// Time from releasing the line to sampling for a presence pulse
    pub presence_wait: MicrosDurationU32,
    /// Time after sampling before the next slot may start
    pub recovery: MicrosDurationU32,
}

impl ResetTiming {
    pub const DEFAULT: Self = Self {
        pulse: MicrosDurationU32::micros(480),
        presence_wait: MicrosDurationU32::micros(85),
        recovery: MicrosDurationU32::micros(395),
    };

    /// Total length of the handshake
    pub fn total(self) -> MicrosDurationU32 {
        self.pulse + self.presence_wait + self.recovery
    }
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub struct OneWire<L> {
    line: L,
    reset_timing: ResetTiming,
}

impl<L: BusLine> OneWire<L> {
    pub const fn new(line: L) -> Self {
        Self::with_reset_timing(line, ResetTiming::DEFAULT)
    }

    pub const fn with_reset_timing(line: L, reset_timing: ResetTiming) -> Self {
        Self { line, reset_timing }
    }

    /// Gives the bus line back
    pub fn free(self) -> L {
        self.line
    }

    /// Perform a reset initialization sequence
    ///
    /// Returns `true` if a device answered with a presence pulse. No device is not an error here, it's
    /// up to the caller whether to retry or carry on.
    pub fn reset(&mut self, delay: &mut impl DelayUs<u32>) -> Result<bool, L::Error> {
        let timing = self.reset_timing;

        // Pull the bus low for the reset pulse
        self.line.drive_low()?;
        delay.delay_us(timing.pulse.to_micros());

        // Release the bus and look for the device pulling it back down
        let is_low = critical_section::with(|_| {
            self.line.release()?;
            delay.delay_us(timing.presence_wait.to_micros());
            self.line.sense().map(|high| !high)
        })?;

        delay.delay_us(timing.recovery.to_micros());

        Ok(is_low)
    }

    /// Write a single bit to the bus
    ///
    /// Both values take the same [`SLOT_US`], only the position of the rising edge differs.
    pub fn write_bit(&mut self, bit: bool, delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        let (low, high) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_RELEASE_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_RELEASE_US)
        };

        critical_section::with(|_| {
            self.line.drive_low()?;
            delay.delay_us(low);
            self.line.release()?;
            delay.delay_us(high);
            Ok(())
        })
    }

    /// Read a single bit from the bus
    pub fn read_bit(&mut self, delay: &mut impl DelayUs<u32>) -> Result<bool, L::Error> {
        critical_section::with(|_| {
            // Start the slot
            self.line.drive_low()?;
            delay.delay_us(READ_INIT_US);
            self.line.release()?;

            // A device sending 0 holds the line low past this point
            delay.delay_us(READ_SAMPLE_US);
            let bit = self.line.sense()?;

            // Wait for the end of the timeslot
            delay.delay_us(READ_RECOVERY_US);

            Ok(bit)
        })
    }

    /// Write a single byte to the bus, least significant bit first
    pub fn write_byte(&mut self, byte: u8, delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(byte & 0x01 == 0x01, delay)?;
            byte >>= 1;
        }
        Ok(())
    }

    /// Write multiple bytes to the bus
    pub fn write_bytes(&mut self, bytes: &[u8], delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        for byte in bytes {
            self.write_byte(*byte, delay)?;
        }
        Ok(())
    }

    /// Read a single byte from the bus
    ///
    /// The device sends the least significant bit first. Bits are shifted in from the right, which
    /// leaves them mirrored, so the result is reversed before returning.
    pub fn read_byte(&mut self, delay: &mut impl DelayUs<u32>) -> Result<u8, L::Error> {
        let mut ret = u8::from(self.read_bit(delay)?);
        for _ in 1..8 {
            ret <<= 1;
            ret |= u8::from(self.read_bit(delay)?);
        }
        Ok(bit_reverse(ret))
    }

    /// Read multiple bytes from the bus
    pub fn read_bytes(&mut self, bytes: &mut [u8], delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        for byte in bytes {
            *byte = self.read_byte(delay)?;
        }
        Ok(())
    }

    /// Do a ROM skip
    pub fn skip_address(&mut self, delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        self.write_byte(commands::SKIP_ROM, delay)
    }

    /// Send a command to the bus
    ///
    /// Does the following sequence:
    /// 1. Reset the bus
    /// 2. Skip addressing
    /// 3. Write the command byte
    ///
    /// Returns whether a device answered the reset. The command is sent either way.
    pub fn send_command(&mut self, command: u8, delay: &mut impl DelayUs<u32>) -> Result<bool, L::Error> {
        let present = self.reset(delay)?;
        self.skip_address(delay)?;
        self.write_byte(command, delay)?;
        Ok(present)
    }
}

/// Mirrors the bits of a byte: bit 0 swaps with bit 7, bit 1 with bit 6, and so on.
pub const fn bit_reverse(x: u8) -> u8 {
    let x = ((x >> 1) & 0x55) | ((x << 1) & 0xAA);
    let x = ((x >> 2) & 0x33) | ((x << 2) & 0xCC);
    ((x >> 4) & 0x0F) | ((x << 4) & 0xF0)
}
