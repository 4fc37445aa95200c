#![cfg_attr(not(test), no_std)]

//! Thin, checked layer between firmware logic and the vendor USB/GPIO driver.
//!
//! The crate is layered like a HAL:
//!
//! 1. driver contracts (under `traits`), implemented by the board or vendor layer
//! 1. adapters implementing those contracts over `embedded-hal` pins and
//!    `usb-device` buses (under `drivers`)
//! 1. the facades firmware talks to: [`Gpio`] and [`Ep0`]
//!
//! A control request is handled by creating a [`Transfer`] when the setup
//! packet is dispatched, and passing it to every EP0 call:
//!
//! ```ignore
//! let mut transfer = Transfer::new(setup.length);
//! ep0.send(&mut transfer, &[0x01, 0x02])?;
//! ep0.send_ack(&mut transfer)?;
//! assert!(transfer.is_complete());
//! ```

#[macro_use]
extern crate delog;
generate_macros!();

pub mod constants;

pub mod error;
pub use error::{Error, Result};

pub mod traits;

pub mod drivers;
pub use drivers::{
    BusEndpoint,
    InputBank,
    PinBank,
};

pub mod gpio;
pub use gpio::{
    Gpio,
    Level,
    PinId,
};

pub mod ep0;
pub use ep0::{
    Ep0,
    State,
    Transfer,
};
