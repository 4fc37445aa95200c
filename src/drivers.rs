//! Driver contracts implemented over ecosystem traits.
//!
//! Boards whose pins implement `embedded-hal` and whose USB peripheral
//! implements `usb-device` can use these directly instead of writing their
//! own `GpioDriver` or `ControlEndpoint`.

pub mod pins;
pub use pins::{InputBank, PinBank, PinError};

pub mod usbd;
pub use usbd::{BusEndpoint, Deferred};
