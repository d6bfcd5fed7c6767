//! ROM command bytes. Only the broadcast form is used; the bus carries a single device.

/// Address every device on the bus at once
pub const SKIP_ROM: u8 = 0xCC;
