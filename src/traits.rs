//! Contracts the board or vendor driver layer fulfils.
//!
//! The facades never reach past these traits; implementing them is the only
//! thing a new board needs to do. Ready-made implementations for
//! `embedded-hal` pins and `usb-device` buses live under `drivers`.

pub mod gpio;
pub mod usb;
