pub use crate::error::DriverError;

/// Raw access to the control endpoint of the USB controller.
///
/// All stage operations follow the `nb` convention: `WouldBlock` means "not
/// done yet, call again with the same arguments". Implementations keep
/// whatever progress they need between calls and reset it once they return
/// `Ok` or `Err(Other(_))`.
///
/// Each method drives exactly one stage of the transfer the firmware is
/// currently answering; the state machine in `Ep0` guarantees the sequence.
pub trait ControlEndpoint {
    /// IN data stage: hand all of `data` to the host.
    fn write_data(&mut self, data: &[u8]) -> nb::Result<(), DriverError>;

    /// OUT data stage: fill `buf` with what the host sends.
    ///
    /// `buf` is as long as the stage the host announced, so the stage is over
    /// on a short packet or once `buf` is full. Returns the number of bytes
    /// received. A packet that does not fit the rest of `buf` must fail with
    /// `DriverError::Overflow`, never write past `buf`.
    fn read_data(&mut self, buf: &mut [u8]) -> nb::Result<usize, DriverError>;

    /// IN status stage: send a zero-length packet.
    fn write_status(&mut self) -> nb::Result<(), DriverError>;

    /// OUT status stage: accept the host's zero-length packet.
    fn read_status(&mut self) -> nb::Result<(), DriverError>;

    /// Make EP0 answer the current transfer with STALL.
    fn stall(&mut self);
}

impl<E> ControlEndpoint for &mut E
where
    E: ControlEndpoint + ?Sized,
{
    fn write_data(&mut self, data: &[u8]) -> nb::Result<(), DriverError> {
        (**self).write_data(data)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> nb::Result<usize, DriverError> {
        (**self).read_data(buf)
    }

    fn write_status(&mut self) -> nb::Result<(), DriverError> {
        (**self).write_status()
    }

    fn read_status(&mut self) -> nb::Result<(), DriverError> {
        (**self).read_status()
    }

    fn stall(&mut self) {
        (**self).stall()
    }
}
