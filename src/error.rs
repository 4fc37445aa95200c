use core::fmt;

use usb_device::UsbError;

/// Failure of a GPIO or EP0 operation.
///
/// Nothing in this crate retries; every failure is handed to the caller, who
/// knows whether repeating the operation is still meaningful.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The pin identifier is not exposed by this board (caller error).
    InvalidPin,
    /// The underlying driver reported an unexpected failure.
    HardwareFault,
    /// The host cancelled the control transfer, or the bus failed under it.
    TransferAborted,
    /// The host sent more data than the receive buffer can hold.
    BufferTooSmall,
    /// EP0 call out of order for its transfer, e.g. a second `send_ack`.
    InvalidState,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::InvalidPin => "invalid pin",
            Error::HardwareFault => "hardware fault",
            Error::TransferAborted => "transfer aborted",
            Error::BufferTooSmall => "buffer too small",
            Error::InvalidState => "invalid transfer state",
        })
    }
}

/// Failure reported by an EP0 driver (see `traits::usb::ControlEndpoint`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DriverError {
    /// Bus reset, new SETUP, or host cancellation.
    Aborted,
    /// The host sent more than the buffer holds.
    Overflow,
    /// Anything else the controller complains about.
    Fault,
}

impl From<DriverError> for Error {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::Aborted => Error::TransferAborted,
            DriverError::Overflow => Error::BufferTooSmall,
            DriverError::Fault => Error::HardwareFault,
        }
    }
}

impl From<UsbError> for DriverError {
    /// Callers must filter out `UsbError::WouldBlock` first; it is not a failure.
    fn from(error: UsbError) -> Self {
        match error {
            UsbError::BufferOverflow => DriverError::Overflow,
            _ => DriverError::Fault,
        }
    }
}

/// Lift a `usb-device` result into the `nb` convention of the driver traits.
pub(crate) fn nb_usb<T>(result: usb_device::Result<T>) -> nb::Result<T, DriverError> {
    result.map_err(|error| match error {
        UsbError::WouldBlock => nb::Error::WouldBlock,
        other => nb::Error::Other(other.into()),
    })
}
