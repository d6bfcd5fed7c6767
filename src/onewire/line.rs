//! The physical bus line the driver talks through.

use embedded_hal::digital::v2::{InputPin, OutputPin};

/// A single open-drain line with an external pull-up.
///
/// The driver only ever pulls the line low or lets go of it; the high level always comes from the
/// pull-up or a device on the bus.
pub trait BusLine {
    type Error;

    /// Actively pull the line low
    fn drive_low(&mut self) -> Result<(), Self::Error>;

    /// Stop driving the line, leaving its level to the pull-up and devices
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Sample the line. Returns `true` if the line is high.
    fn sense(&mut self) -> Result<bool, Self::Error>;
}

/// A bus line backed by a GPIO configured as an open-drain output.
///
/// Setting an open-drain output high releases the line, so the pin can be read back while released.
pub struct OpenDrainPin<PIN> {
    pin: PIN,
}

impl<PIN, E> OpenDrainPin<PIN>
where
    PIN: OutputPin<Error = E> + InputPin<Error = E>,
{
    /// Wraps the pin and releases the line.
    pub fn new(mut pin: PIN) -> Result<Self, E> {
        pin.set_high()?;
        Ok(Self { pin })
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}

impl<PIN, E> BusLine for OpenDrainPin<PIN>
where
    PIN: OutputPin<Error = E> + InputPin<Error = E>,
{
    type Error = E;

    fn drive_low(&mut self) -> Result<(), E> {
        self.pin.set_low()
    }

    fn release(&mut self) -> Result<(), E> {
        self.pin.set_high()
    }

    fn sense(&mut self) -> Result<bool, E> {
        self.pin.is_high()
    }
}
