//! Control transfers on EP0, with bounded buffers and an explicit state machine.
//!
//! Every transfer goes
//!
//! ```text
//! Setup --send/receive--> DataDone --send_ack--> Complete
//! Setup --send_ack-----------------------------> Complete
//! any   --abort / overflow / fault / stall-----> Aborted
//! ```
//!
//! and the [`Transfer`] handle passed to each call is what enforces it:
//! out-of-order calls are rejected before they reach the controller.
//!
//! A transfer carries the `wLength` of its setup packet, which bounds both
//! data stages. Receiving follows a reject policy: if the host announces more
//! than the buffer holds, `receive` fails with `Error::BufferTooSmall` before
//! any data is read, rather than returning a truncated message, and the
//! transfer is aborted. The caller usually answers with [`Ep0::stall`].

use usb_device::UsbDirection;

use crate::{
    error::{DriverError, Error, Result},
    traits::usb::ControlEndpoint,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    /// Setup packet dispatched, no stage run yet
    Setup,
    /// Data stage done, in the given direction
    DataDone(UsbDirection),
    /// Status stage done
    Complete,
    /// Cancelled by the host, failed on the bus, or stalled
    Aborted,
}

/// One control transfer, from setup dispatch to status stage.
///
/// Create one per setup packet; it is not reusable.
#[derive(Debug, Eq, PartialEq)]
pub struct Transfer {
    state: State,
    w_length: u16,
}

impl Transfer {
    /// `w_length` is the data stage length announced by the setup packet.
    pub fn new(w_length: u16) -> Self {
        Self { state: State::Setup, w_length }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn w_length(&self) -> u16 {
        self.w_length
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    pub fn is_aborted(&self) -> bool {
        self.state == State::Aborted
    }

    fn check_data_stage(&self) -> Result<()> {
        match self.state {
            State::Setup => Ok(()),
            State::Aborted => Err(Error::TransferAborted),
            _ => {
                warn!("data stage requested in state {:?}", self.state);
                Err(Error::InvalidState)
            }
        }
    }

    fn abort(&mut self, error: DriverError) -> Error {
        warn!("ep0 transfer aborted in state {:?}: {:?}", self.state, error);
        self.state = State::Aborted;
        error.into()
    }
}

/// Safe EP0 interface on top of a `ControlEndpoint` driver.
///
/// All calls block until the driver has finished the stage (or failed).
pub struct Ep0<E> {
    endpoint: E,
}

impl<E> Ep0<E>
where
    E: ControlEndpoint,
{
    pub fn new(endpoint: E) -> Self {
        Self { endpoint }
    }

    pub fn release(self) -> E {
        self.endpoint
    }

    /// Send `data` as the IN data stage.
    ///
    /// `data` longer than the transfer's `wLength` fails with `BufferTooSmall`
    /// and leaves the transfer as it was, so a shorter answer can still be sent.
    pub fn send(&mut self, transfer: &mut Transfer, data: &[u8]) -> Result<()> {
        transfer.check_data_stage()?;
        if data.len() > usize::from(transfer.w_length) {
            warn!("{} bytes do not fit wLength {}", data.len(), transfer.w_length);
            return Err(Error::BufferTooSmall);
        }
        trace!("ep0 IN {} bytes: {}", data.len(), delog::hex_str!(&data));

        match nb::block!(self.endpoint.write_data(data)) {
            Ok(()) => {
                transfer.state = State::DataDone(UsbDirection::In);
                Ok(())
            }
            Err(error) => Err(transfer.abort(error)),
        }
    }

    /// Receive the OUT data stage into `buffer`, returning how many bytes arrived.
    ///
    /// The returned length never exceeds `buffer.len()`. A `wLength` larger
    /// than the buffer is an error (`BufferTooSmall`), not a truncation, and
    /// the driver is only ever handed the first `wLength` bytes of `buffer`.
    pub fn receive(&mut self, transfer: &mut Transfer, buffer: &mut [u8]) -> Result<usize> {
        transfer.check_data_stage()?;
        let capacity = buffer.len();
        let expected = usize::from(transfer.w_length);

        if expected > capacity {
            error!("host announces {} bytes for a {} byte buffer", expected, capacity);
            return Err(transfer.abort(DriverError::Overflow));
        }
        if expected == 0 {
            transfer.state = State::DataDone(UsbDirection::Out);
            return Ok(0);
        }

        match nb::block!(self.endpoint.read_data(&mut buffer[..expected])) {
            Ok(received) if received <= expected => {
                trace!("ep0 OUT {} of {} bytes", received, expected);
                transfer.state = State::DataDone(UsbDirection::Out);
                Ok(received)
            }
            Ok(_received) => {
                error!("driver reports {} bytes for a {} byte stage", _received, expected);
                Err(transfer.abort(DriverError::Overflow))
            }
            Err(error) => Err(transfer.abort(error)),
        }
    }

    /// Complete the transfer with a zero-length status stage.
    ///
    /// The status stage runs opposite to the data stage: after `send` the
    /// host's empty OUT packet is accepted, otherwise an empty IN packet is
    /// sent. Must be called exactly once per successful transfer.
    pub fn send_ack(&mut self, transfer: &mut Transfer) -> Result<()> {
        let result = match transfer.state {
            State::Setup | State::DataDone(UsbDirection::Out) => {
                nb::block!(self.endpoint.write_status())
            }
            State::DataDone(UsbDirection::In) => nb::block!(self.endpoint.read_status()),
            State::Aborted => return Err(Error::TransferAborted),
            State::Complete => {
                warn!("transfer already acknowledged");
                return Err(Error::InvalidState);
            }
        };

        match result {
            Ok(()) => {
                debug!("ep0 transfer complete");
                transfer.state = State::Complete;
                Ok(())
            }
            Err(error) => Err(transfer.abort(error)),
        }
    }

    /// Refuse the request by stalling EP0; the transfer ends as `Aborted`.
    ///
    /// Also the usual answer to a transfer that already aborted.
    pub fn stall(&mut self, transfer: &mut Transfer) -> Result<()> {
        if transfer.is_complete() {
            return Err(Error::InvalidState);
        }
        info!("stalling ep0 in state {:?}", transfer.state);
        self.endpoint.stall();
        transfer.state = State::Aborted;
        Ok(())
    }
}
