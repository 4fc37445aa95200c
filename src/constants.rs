/// Endpoint number of the control endpoint
pub const EP0: usize = 0;

/// Default EP0 max packet size, the largest full-speed value
pub const EP0_MAX_PACKET_SIZE: usize = 64;

/// EP0 max packet sizes allowed by USB 2.0 for full-speed devices
pub const EP0_PACKET_SIZES: [usize; 4] = [8, 16, 32, 64];

/// Bit of EP0 in the `ep_out`/`ep_in_complete`/`ep_setup` masks of a `PollResult`
pub const EP0_MASK: u16 = 1 << EP0;
