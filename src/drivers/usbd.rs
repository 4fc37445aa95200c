//! EP0 stages driven packet by packet on a `usb_device::bus::UsbBus`.

use core::cmp::min;

use usb_device::{
    bus::{PollResult, UsbBus},
    endpoint::EndpointAddress,
    UsbDirection,
};

use crate::{
    constants::{EP0, EP0_MASK, EP0_MAX_PACKET_SIZE, EP0_PACKET_SIZES},
    error::{nb_usb, DriverError},
    traits::usb::ControlEndpoint,
};

/// Bus events seen while a stage was blocking, that were not ours to handle.
///
/// Masks use the same bit layout as `PollResult::Data`. Hand them to
/// whatever normally services the bus once the transfer is done.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Deferred {
    pub reset: bool,
    pub suspend: bool,
    pub resume: bool,
    pub ep_out: u16,
    pub ep_in_complete: u16,
    pub ep_setup: u16,
}

impl Deferred {
    pub fn is_empty(&self) -> bool {
        *self == Deferred::default()
    }
}

#[derive(Copy, Clone, Default)]
struct Ep0Events {
    in_complete: bool,
}

/// Implements `ControlEndpoint` on EP0 of a `usb-device` bus.
///
/// The adapter owns polling while a stage is in progress:
///
/// - a bus reset, or a SETUP arriving on EP0, aborts the stage (the SETUP
///   stays unread, for the dispatcher)
/// - EP0 IN completions pace the packets of IN stages
/// - everything else is collected in [`Deferred`], see [`BusEndpoint::take_deferred`]
///
/// IN data is split into packets of the EP0 max packet size. A data stage
/// that is an exact multiple of it ends without a zero-length packet, which
/// is correct as long as the caller sends exactly `wLength` bytes in that
/// case. OUT data stages end on a short packet or when `buf` is full; `Ep0`
/// hands in exactly `wLength` bytes of buffer, so "full" is the end of the
/// stage as the host announced it. A packet larger than the space left is
/// an overflow.
///
/// SETUP packets are read through the same EP0 OUT `read` as data. Each OUT
/// step polls right before reading, but a SETUP landing between that poll
/// and the read is taken for data: the bus offers no atomic check.
pub struct BusEndpoint<'a, B>
where
    B: UsbBus,
{
    bus: &'a B,
    max_packet_size: usize,
    // progress of the current stage
    offset: usize,
    in_flight: bool,
    deferred: Deferred,
}

impl<'a, B> BusEndpoint<'a, B>
where
    B: UsbBus,
{
    pub fn new(bus: &'a B) -> Self {
        Self {
            bus,
            max_packet_size: EP0_MAX_PACKET_SIZE,
            offset: 0,
            in_flight: false,
            deferred: Deferred::default(),
        }
    }

    /// For EP0 configured with a smaller packet size; `None` unless it is 8, 16, 32 or 64.
    pub fn with_max_packet_size(bus: &'a B, max_packet_size: usize) -> Option<Self> {
        if !EP0_PACKET_SIZES.contains(&max_packet_size) {
            return None;
        }
        let mut endpoint = Self::new(bus);
        endpoint.max_packet_size = max_packet_size;
        Some(endpoint)
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Return and clear the events that arrived for others.
    pub fn take_deferred(&mut self) -> Deferred {
        core::mem::take(&mut self.deferred)
    }

    fn ep0_in() -> EndpointAddress {
        EndpointAddress::from_parts(EP0, UsbDirection::In)
    }

    fn ep0_out() -> EndpointAddress {
        EndpointAddress::from_parts(EP0, UsbDirection::Out)
    }

    fn poll(&mut self) -> Result<Ep0Events, DriverError> {
        match self.bus.poll() {
            PollResult::None => Ok(Ep0Events::default()),

            PollResult::Reset => {
                self.deferred.reset = true;
                warn!("bus reset during ep0 stage");
                Err(DriverError::Aborted)
            }

            PollResult::Suspend => {
                self.deferred.suspend = true;
                Ok(Ep0Events::default())
            }

            PollResult::Resume => {
                self.deferred.resume = true;
                Ok(Ep0Events::default())
            }

            PollResult::Data { ep_out, ep_in_complete, ep_setup } => {
                self.deferred.ep_in_complete |= ep_in_complete & !EP0_MASK;
                self.deferred.ep_setup |= ep_setup & !EP0_MASK;

                if ep_setup & EP0_MASK != 0 {
                    // the new request supersedes ours, its SETUP is someone else's to read
                    self.deferred.ep_setup |= EP0_MASK;
                    self.deferred.ep_out |= ep_out;
                    warn!("SETUP during ep0 stage");
                    return Err(DriverError::Aborted);
                }
                // EP0 OUT data is picked up by `read`, no need to track its flag
                self.deferred.ep_out |= ep_out & !EP0_MASK;

                Ok(Ep0Events {
                    in_complete: ep_in_complete & EP0_MASK != 0,
                })
            }
        }
    }

    /// Forget stage progress once a stage is finished, one way or the other.
    fn settle<T>(&mut self, result: nb::Result<T, DriverError>) -> nb::Result<T, DriverError> {
        if !matches!(result, Err(nb::Error::WouldBlock)) {
            self.offset = 0;
            self.in_flight = false;
        }
        result
    }

    fn step_data_in(&mut self, data: &[u8]) -> nb::Result<(), DriverError> {
        let events = self.poll()?;

        if self.in_flight {
            if !events.in_complete {
                return Err(nb::Error::WouldBlock);
            }
            self.in_flight = false;
            if self.offset == data.len() {
                return Ok(());
            }
        }

        // at least one packet goes out, a zero-length one for empty data
        let end = min(self.offset + self.max_packet_size, data.len());
        let written = nb_usb(self.bus.write(Self::ep0_in(), &data[self.offset..end]))?;
        trace!("ep0 IN packet {}..{}", self.offset, self.offset + written);
        self.offset += written;
        self.in_flight = true;
        Err(nb::Error::WouldBlock)
    }

    fn step_data_out(&mut self, buf: &mut [u8]) -> nb::Result<usize, DriverError> {
        // a pending SETUP must be seen here, `read` would hand it out as data
        self.poll()?;

        let received = nb_usb(self.bus.read(Self::ep0_out(), &mut buf[self.offset..]))?;
        trace!("ep0 OUT packet {}..{}", self.offset, self.offset + received);
        self.offset += received;

        if received < self.max_packet_size || self.offset == buf.len() {
            Ok(self.offset)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn step_status_in(&mut self) -> nb::Result<(), DriverError> {
        let events = self.poll()?;

        if self.in_flight {
            return if events.in_complete {
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            };
        }

        nb_usb(self.bus.write(Self::ep0_in(), &[]))?;
        self.in_flight = true;
        Err(nb::Error::WouldBlock)
    }

    fn step_status_out(&mut self) -> nb::Result<(), DriverError> {
        self.poll()?;

        match nb_usb(self.bus.read(Self::ep0_out(), &mut [])) {
            Ok(_) => Ok(()),
            // the status stage carries no data
            Err(nb::Error::Other(DriverError::Overflow)) => Err(nb::Error::Other(DriverError::Fault)),
            Err(other) => Err(other),
        }
    }
}

impl<'a, B> ControlEndpoint for BusEndpoint<'a, B>
where
    B: UsbBus,
{
    fn write_data(&mut self, data: &[u8]) -> nb::Result<(), DriverError> {
        let result = self.step_data_in(data);
        self.settle(result)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> nb::Result<usize, DriverError> {
        let result = self.step_data_out(buf);
        self.settle(result)
    }

    fn write_status(&mut self) -> nb::Result<(), DriverError> {
        let result = self.step_status_in();
        self.settle(result)
    }

    fn read_status(&mut self) -> nb::Result<(), DriverError> {
        let result = self.step_status_out();
        self.settle(result)
    }

    fn stall(&mut self) {
        self.bus.set_stalled(Self::ep0_in(), true);
        self.bus.set_stalled(Self::ep0_out(), true);
        self.offset = 0;
        self.in_flight = false;
    }
}
