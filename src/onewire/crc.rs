//! Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1).

use super::{Error, Result};

/// Computes the CRC-8 of `data`, processing bits least-significant first as they come off the bus.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut byte = byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

/// Checks a block whose last byte is the CRC-8 of everything before it.
pub fn check_crc8<E>(block: &[u8]) -> Result<(), E> {
    match block.split_last() {
        Some((&crc, data)) if crc8(data) == crc => Ok(()),
        _ => Err(Error::CrcMismatch),
    }
}
