//! Digital pins by number, without the driver's pin naming or register quirks.

use crate::{
    error::{Error, Result},
    traits::gpio::GpioDriver,
};

/// Board-level number of a GPIO line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PinId(pub u8);

impl From<u8> for PinId {
    fn from(number: u8) -> Self {
        PinId(number)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(is_high: bool) -> Self {
        if is_high { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

/// Checked access to the pins of a `GpioDriver`.
///
/// The pin is validated before the driver sees it, so a failed call on an
/// unmapped pin has no side effect. Driver errors are reported once, as
/// `HardwareFault`; writes are not retried.
pub struct Gpio<D> {
    driver: D,
}

impl<D> Gpio<D>
where
    D: GpioDriver,
{
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Give the driver back, e.g. to reconfigure pins.
    pub fn release(self) -> D {
        self.driver
    }

    pub fn set_pin_level(&mut self, pin: PinId, level: Level) -> Result<()> {
        self.check(pin)?;
        self.driver.set_level(pin, level).map_err(|_error| {
            error!("setting {:?} to {:?} failed: {:?}", pin, level, _error);
            Error::HardwareFault
        })
    }

    pub fn get_pin_level(&self, pin: PinId) -> Result<Level> {
        self.check(pin)?;
        self.driver.level(pin).map_err(|_error| {
            error!("reading {:?} failed: {:?}", pin, _error);
            Error::HardwareFault
        })
    }

    fn check(&self, pin: PinId) -> Result<()> {
        if self.driver.exposes(pin) {
            Ok(())
        } else {
            warn!("{:?} is not exposed by this board", pin);
            Err(Error::InvalidPin)
        }
    }
}
