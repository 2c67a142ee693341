// ============================================
// File: crates/mref-core/src/crc.rs
// ============================================
//! # M17 CRC-16
//!
//! ## Creation Reason
//! Every voice frame carries a trailing CRC that must validate before
//! any field is trusted. The M17 variant (poly 0x5935, init 0xFFFF, no
//! reflection, no final xor) is not one of the stock CRC-16s, so it is
//! implemented here with a table built at compile time.
//!
//! ## Check Values
//! - `""` → 0xFFFF
//! - `"A"` → 0x206E
//! - `"123456789"` → 0x772B
//!
//! ## Last Modified
//! v0.1.0 - Initial CRC implementation

const POLYNOMIAL: u16 = 0x5935;
const INITIAL: u16 = 0xFFFF;

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static TABLE: [u16; 256] = build_table();

/// Computes the M17 CRC-16 of `data`.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = INITIAL;
    for &byte in data {
        let index = ((crc >> 8) ^ u16::from(byte)) & 0xFF;
        crc = (crc << 8) ^ TABLE[index as usize];
    }
    crc
}

/// Checks that the last two bytes of `frame` hold the big-endian CRC of
/// everything before them.
///
/// Returns `false` for anything shorter than 3 bytes.
#[must_use]
pub fn verify_trailing(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let body = &frame[..frame.len() - 2];
    let tail = &frame[frame.len() - 2..];
    let stored = u16::from_be_bytes([tail[0], tail[1]]);
    crc16(body) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_check_values() {
        assert_eq!(crc16(b""), 0xFFFF);
        assert_eq!(crc16(b"A"), 0x206E);
        assert_eq!(crc16(b"123456789"), 0x772B);
    }

    #[test]
    fn test_verify_trailing() {
        let mut frame = b"123456789".to_vec();
        frame.extend_from_slice(&0x772Bu16.to_be_bytes());
        assert!(verify_trailing(&frame));

        // flip one payload bit
        frame[0] ^= 0x01;
        assert!(!verify_trailing(&frame));
    }

    #[test]
    fn test_verify_trailing_too_short() {
        assert!(!verify_trailing(&[]));
        assert!(!verify_trailing(&[0xFF, 0xFF]));
    }
}
