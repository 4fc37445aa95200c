#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::Mutex;

use hal_shim::{
    error::DriverError,
    traits::{gpio::GpioDriver, usb::ControlEndpoint},
    Level, PinId,
};

pub const PINS: u8 = 8;

/// Board with `PINS` lines, counting what reaches it.
pub struct Board {
    pub levels: [Level; PINS as usize],
    pub writes: usize,
    pub reads: Cell<usize>,
    pub broken: bool,
}

impl Board {
    pub fn new() -> Self {
        Self {
            levels: [Level::Low; PINS as usize],
            writes: 0,
            reads: Cell::new(0),
            broken: false,
        }
    }
}

impl GpioDriver for Board {
    type Error = &'static str;

    fn exposes(&self, pin: PinId) -> bool {
        pin.0 < PINS
    }

    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), Self::Error> {
        self.writes += 1;
        if self.broken {
            return Err("line stuck");
        }
        self.levels[pin.0 as usize] = level;
        Ok(())
    }

    fn level(&self, pin: PinId) -> Result<Level, Self::Error> {
        self.reads.set(self.reads.get() + 1);
        if self.broken {
            return Err("no sense amplifier");
        }
        Ok(self.levels[pin.0 as usize])
    }
}

pub mod pins {
    use std::cell::Cell;

    use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin};

    #[derive(Default)]
    pub struct Led {
        pub high: bool,
    }

    impl OutputPin for Led {
        type Error = ();

        fn set_high(&mut self) -> Result<(), ()> {
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), ()> {
            self.high = false;
            Ok(())
        }
    }

    impl StatefulOutputPin for Led {
        fn is_set_high(&self) -> Result<bool, ()> {
            Ok(self.high)
        }

        fn is_set_low(&self) -> Result<bool, ()> {
            Ok(!self.high)
        }
    }

    /// A pin behind an I/O expander that has gone away.
    pub struct Detached;

    impl OutputPin for Detached {
        type Error = ();

        fn set_high(&mut self) -> Result<(), ()> {
            Err(())
        }

        fn set_low(&mut self) -> Result<(), ()> {
            Err(())
        }
    }

    impl StatefulOutputPin for Detached {
        fn is_set_high(&self) -> Result<bool, ()> {
            Err(())
        }

        fn is_set_low(&self) -> Result<bool, ()> {
            Err(())
        }
    }

    /// A push button, pressed pulls the line high.
    #[derive(Default)]
    pub struct Button {
        pub pressed: Cell<bool>,
    }

    impl InputPin for Button {
        type Error = ();

        fn is_high(&self) -> Result<bool, ()> {
            Ok(self.pressed.get())
        }

        fn is_low(&self) -> Result<bool, ()> {
            Ok(!self.pressed.get())
        }
    }
}

/// Simulated host on the other end of EP0.
///
/// Every stage first answers `WouldBlock` for `pending_rounds` calls, like an
/// interrupt-driven controller would, then completes or fails with `fail_next`.
#[derive(Default)]
pub struct Host {
    /// IN data stages the device sent
    pub received: Vec<Vec<u8>>,
    /// payload of the host's OUT data stage
    pub payload: Vec<u8>,
    pub pending_rounds: usize,
    pub fail_next: Option<DriverError>,
    /// report the full payload length even when it did not fit
    pub misreport_length: bool,
    pub status_in: usize,
    pub status_out: usize,
    pub stalls: usize,
    pub calls: usize,
    rounds: usize,
}

impl Host {
    pub fn sending(payload: &[u8]) -> Self {
        Self { payload: payload.to_vec(), ..Self::default() }
    }

    fn pend(&mut self) -> nb::Result<(), DriverError> {
        self.calls += 1;
        if self.rounds < self.pending_rounds {
            self.rounds += 1;
            return Err(nb::Error::WouldBlock);
        }
        self.rounds = 0;
        match self.fail_next.take() {
            Some(error) => Err(nb::Error::Other(error)),
            None => Ok(()),
        }
    }
}

impl ControlEndpoint for Host {
    fn write_data(&mut self, data: &[u8]) -> nb::Result<(), DriverError> {
        self.pend()?;
        self.received.push(data.to_vec());
        Ok(())
    }

    fn read_data(&mut self, buf: &mut [u8]) -> nb::Result<usize, DriverError> {
        self.pend()?;
        if self.payload.len() > buf.len() {
            if self.misreport_length {
                buf.copy_from_slice(&self.payload[..buf.len()]);
                return Ok(self.payload.len());
            }
            return Err(nb::Error::Other(DriverError::Overflow));
        }
        buf[..self.payload.len()].copy_from_slice(&self.payload);
        Ok(self.payload.len())
    }

    fn write_status(&mut self) -> nb::Result<(), DriverError> {
        self.pend()?;
        self.status_in += 1;
        Ok(())
    }

    fn read_status(&mut self) -> nb::Result<(), DriverError> {
        self.pend()?;
        self.status_out += 1;
        Ok(())
    }

    fn stall(&mut self) {
        self.stalls += 1;
    }
}

pub mod bus {
    use super::*;

    use usb_device::{
        bus::{PollResult, UsbBus},
        endpoint::{EndpointAddress, EndpointType},
        UsbDirection, UsbError,
    };

    pub enum Event {
        Idle,
        Reset,
        Setup,
        Suspend,
        Foreign { ep_out: u16, ep_in_complete: u16 },
    }

    #[derive(Default)]
    pub struct Wire {
        /// host to device packets on EP0 OUT
        pub out_packets: VecDeque<Vec<u8>>,
        /// device to host packets on EP0 IN
        pub in_packets: Vec<Vec<u8>>,
        /// scripted results of `poll`, before IN completions are reported
        pub events: VecDeque<Event>,
        pub in_pending: bool,
        pub write_error: Option<UsbError>,
        pub stalled_in: bool,
        pub stalled_out: bool,
    }

    /// Full-speed bus with only EP0 wired up.
    #[derive(Default)]
    pub struct FakeBus {
        pub wire: Mutex<Wire>,
    }

    impl FakeBus {
        pub fn with_out_packets(packets: &[&[u8]]) -> Self {
            let bus = FakeBus::default();
            bus.wire.lock().unwrap().out_packets = packets.iter().map(|p| p.to_vec()).collect();
            bus
        }

        pub fn in_packet_sizes(&self) -> Vec<usize> {
            self.wire.lock().unwrap().in_packets.iter().map(Vec::len).collect()
        }
    }

    impl UsbBus for FakeBus {
        fn alloc_ep(
            &mut self,
            _ep_dir: UsbDirection,
            _ep_addr: Option<EndpointAddress>,
            _ep_type: EndpointType,
            _max_packet_size: u16,
            _interval: u8,
        ) -> usb_device::Result<EndpointAddress> {
            Err(UsbError::EndpointOverflow)
        }

        fn enable(&mut self) {}

        fn reset(&self) {}

        fn set_device_address(&self, _addr: u8) {}

        fn write(&self, ep_addr: EndpointAddress, buf: &[u8]) -> usb_device::Result<usize> {
            if ep_addr.index() != 0 || !ep_addr.is_in() {
                return Err(UsbError::InvalidEndpoint);
            }
            let mut wire = self.wire.lock().unwrap();
            if let Some(error) = wire.write_error.take() {
                return Err(error);
            }
            if wire.in_pending {
                return Err(UsbError::WouldBlock);
            }
            wire.in_packets.push(buf.to_vec());
            wire.in_pending = true;
            Ok(buf.len())
        }

        fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> usb_device::Result<usize> {
            if ep_addr.index() != 0 || !ep_addr.is_out() {
                return Err(UsbError::InvalidEndpoint);
            }
            let mut wire = self.wire.lock().unwrap();
            let packet = wire.out_packets.pop_front().ok_or(UsbError::WouldBlock)?;
            if packet.len() > buf.len() {
                return Err(UsbError::BufferOverflow);
            }
            buf[..packet.len()].copy_from_slice(&packet);
            Ok(packet.len())
        }

        fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) {
            let mut wire = self.wire.lock().unwrap();
            match ep_addr.direction() {
                UsbDirection::In => wire.stalled_in = stalled,
                UsbDirection::Out => wire.stalled_out = stalled,
            }
        }

        fn is_stalled(&self, ep_addr: EndpointAddress) -> bool {
            let wire = self.wire.lock().unwrap();
            match ep_addr.direction() {
                UsbDirection::In => wire.stalled_in,
                UsbDirection::Out => wire.stalled_out,
            }
        }

        fn suspend(&self) {}

        fn resume(&self) {}

        fn poll(&self) -> PollResult {
            let mut wire = self.wire.lock().unwrap();
            match wire.events.pop_front() {
                Some(Event::Idle) => PollResult::None,
                Some(Event::Reset) => PollResult::Reset,
                Some(Event::Suspend) => PollResult::Suspend,
                Some(Event::Setup) => PollResult::Data { ep_out: 1, ep_in_complete: 0, ep_setup: 1 },
                Some(Event::Foreign { ep_out, ep_in_complete }) => {
                    PollResult::Data { ep_out, ep_in_complete, ep_setup: 0 }
                }
                None if wire.in_pending => {
                    wire.in_pending = false;
                    PollResult::Data { ep_out: 0, ep_in_complete: 1, ep_setup: 0 }
                }
                None => PollResult::None,
            }
        }
    }
}
