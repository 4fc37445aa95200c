use core::fmt::Debug;

use embedded_hal::digital::v2::{InputPin, StatefulOutputPin};

use crate::{
    gpio::{Level, PinId},
    traits::gpio::GpioDriver,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinError<E> {
    /// No pin in this slot; `Gpio` filters these out before the driver is called.
    NotExposed,
    /// The line is an input and cannot be driven.
    InputOnly,
    Pin(E),
}

/// The board's GPIO lines as a numbered bank of `embedded-hal` pins.
///
/// `PinId(i)` is the pin in slot `i`. The pins may have different concrete
/// types (as typestate pins do), but must share an error type.
///
/// Reading uses `is_set_high`, so `get_pin_level` reports the level the line
/// is driven to, not what is sensed on it. Use [`InputBank`] for inputs.
pub struct PinBank<'a, E, const N: usize> {
    pins: [&'a mut dyn StatefulOutputPin<Error = E>; N],
}

impl<'a, E, const N: usize> PinBank<'a, E, N> {
    pub fn new(pins: [&'a mut dyn StatefulOutputPin<Error = E>; N]) -> Self {
        Self { pins }
    }
}

impl<'a, E, const N: usize> GpioDriver for PinBank<'a, E, N>
where
    E: Debug,
{
    type Error = PinError<E>;

    fn exposes(&self, pin: PinId) -> bool {
        usize::from(pin.0) < N
    }

    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), Self::Error> {
        let line = self.pins.get_mut(usize::from(pin.0)).ok_or(PinError::NotExposed)?;
        let result = match level {
            Level::High => line.set_high(),
            Level::Low => line.set_low(),
        };
        result.map_err(PinError::Pin)
    }

    fn level(&self, pin: PinId) -> Result<Level, Self::Error> {
        let line = self.pins.get(usize::from(pin.0)).ok_or(PinError::NotExposed)?;
        line.is_set_high().map(Level::from).map_err(PinError::Pin)
    }
}

/// Input lines as a numbered bank of `embedded-hal` pins.
///
/// Reading uses `is_high`, the sensed level. Setting a level fails with
/// `PinError::InputOnly`.
pub struct InputBank<'a, E, const N: usize> {
    pins: [&'a dyn InputPin<Error = E>; N],
}

impl<'a, E, const N: usize> InputBank<'a, E, N> {
    pub fn new(pins: [&'a dyn InputPin<Error = E>; N]) -> Self {
        Self { pins }
    }
}

impl<'a, E, const N: usize> GpioDriver for InputBank<'a, E, N>
where
    E: Debug,
{
    type Error = PinError<E>;

    fn exposes(&self, pin: PinId) -> bool {
        usize::from(pin.0) < N
    }

    fn set_level(&mut self, _pin: PinId, _level: Level) -> Result<(), Self::Error> {
        Err(PinError::InputOnly)
    }

    fn level(&self, pin: PinId) -> Result<Level, Self::Error> {
        let line = self.pins.get(usize::from(pin.0)).ok_or(PinError::NotExposed)?;
        line.is_high().map(Level::from).map_err(PinError::Pin)
    }
}
