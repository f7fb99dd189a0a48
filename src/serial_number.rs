//! Serial number encoding and checksum validation.
//!
//! A distributed serial number is 8 ASCII digits: a leading checksum digit,
//! six digits carrying the raw serial under a fixed per-position offset, and
//! a trailing checksum digit.
//!
//! ```text
//!  encoded:  C0  E1 E2 E3 E4 E5 E6  C7
//!  raw[i]  = (10 + E[i+1] - OFFSETS[i]) % 10
//!  C0      = sum(E1..E6) % 10
//!  C7      = (C0 + sum(E1..E6)) % 10
//! ```
//!
//! The checksums are computed over the *encoded* middle digits. This catches
//! transcription errors; it does not resist deliberate forgery.

use std::fmt;

/// Length of an encoded serial number.
pub const ENCODED_SERIAL_LEN: usize = 8;

/// Length of a raw serial number.
pub const RAW_SERIAL_LEN: usize = 6;

/// Per-position offsets applied to the raw digits.
const OFFSETS: [u8; RAW_SERIAL_LEN] = [2, 4, 1, 3, 5, 7];

/// A checksum-verified 6-digit serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSerial(String);

impl RawSerial {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digits<const N: usize>(input: &str) -> Option<[u8; N]> {
    let bytes = input.as_bytes();
    if bytes.len() != N || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut out = [0u8; N];
    for (slot, b) in out.iter_mut().zip(bytes) {
        *slot = b - b'0';
    }
    Some(out)
}

fn checksums(middle: &[u8]) -> (u8, u8) {
    let sum: u32 = middle.iter().map(|&d| u32::from(d)).sum();
    let start = (sum % 10) as u8;
    let end = ((u32::from(start) + sum) % 10) as u8;
    (start, end)
}

/// Decode and verify an 8-digit encoded serial.
///
/// Returns `None` on wrong length, non-digit characters, or a checksum
/// mismatch.
pub fn decode_serial(encoded: &str) -> Option<RawSerial> {
    let d = digits::<ENCODED_SERIAL_LEN>(encoded)?;
    let middle = &d[1..=RAW_SERIAL_LEN];

    let (start, end) = checksums(middle);
    if d[0] != start || d[ENCODED_SERIAL_LEN - 1] != end {
        return None;
    }

    let raw = middle
        .iter()
        .zip(OFFSETS)
        .map(|(&e, off)| char::from(b'0' + (10 + e - off) % 10))
        .collect();
    Some(RawSerial(raw))
}

/// Encode a 6-digit raw serial into its distributable 8-digit form.
///
/// Returns `None` unless `raw` is exactly six ASCII digits.
pub fn encode_serial(raw: &str) -> Option<String> {
    let d = digits::<RAW_SERIAL_LEN>(raw)?;

    let mut middle = [0u8; RAW_SERIAL_LEN];
    for ((slot, &digit), off) in middle.iter_mut().zip(&d).zip(OFFSETS) {
        *slot = (digit + off) % 10;
    }
    let (start, end) = checksums(&middle);

    let mut out = String::with_capacity(ENCODED_SERIAL_LEN);
    out.push(char::from(b'0' + start));
    out.extend(middle.iter().map(|&m| char::from(b'0' + m)));
    out.push(char::from(b'0' + end));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_serial() {
        // raw 000000 -> middle 241357, sum 22 -> C0 = 2, C7 = 4
        assert_eq!(encode_serial("000000").as_deref(), Some("22413574"));
        assert_eq!(decode_serial("22413574").unwrap().as_str(), "000000");
    }

    #[test]
    fn offsets_wrap_around() {
        // raw 999999 -> middle 130246, sum 16 -> C0 = 6, C7 = 2
        assert_eq!(encode_serial("999999").as_deref(), Some("61302462"));
        assert_eq!(decode_serial("61302462").unwrap().as_str(), "999999");
    }

    #[test]
    fn checksum_uses_encoded_digits() {
        // raw 456789: middle 697036, encoded sum 31 (raw sum would be 39)
        let encoded = encode_serial("456789").unwrap();
        assert_eq!(encoded, "16970362");
        assert_eq!(decode_serial(&encoded).unwrap().as_str(), "456789");
    }

    #[test]
    fn rejects_wrong_length_and_non_digits() {
        assert!(decode_serial("").is_none());
        assert!(decode_serial("2241357").is_none());
        assert!(decode_serial("224135740").is_none());
        assert!(decode_serial("2241357a").is_none());
        assert!(decode_serial("２２４１３５７４").is_none());
        assert!(encode_serial("12345").is_none());
        assert!(encode_serial("12a456").is_none());
    }

    #[test]
    fn rejects_checksum_mismatch() {
        assert!(decode_serial("11111111").is_none());
        assert!(decode_serial("32413574").is_none());
        assert!(decode_serial("22413575").is_none());
    }
}
