use crate::gpio::{Level, PinId};

/// Raw digital I/O of the board.
///
/// Only `exposes` decides whether a pin identifier is valid; `set_level` and
/// `level` are never called for a pin it rejects.
pub trait GpioDriver {
    type Error: core::fmt::Debug;

    /// Is `pin` a line this board actually has
    fn exposes(&self, pin: PinId) -> bool;

    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), Self::Error>;

    fn level(&self, pin: PinId) -> Result<Level, Self::Error>;
}
