//! Activation key derivation and formatting.
//!
//! An activation key is the SHA-256 of `fingerprint ++ raw_serial`, rendered
//! as uppercase hex in dash-separated groups of four:
//!
//! ```text
//! 1A2B-3C4D-....-9F0E   (16 groups, 79 characters)
//! ```

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::errors::{RegistError, RegistResult};
use crate::serial_number::RawSerial;

/// Hex characters per dash-separated group.
pub const GROUP_LEN: usize = 4;

/// Length of a formatted SHA-256 activation key.
pub const ACTIVATION_KEY_LEN: usize = 79;

/// Split a hex digest into groups of four joined by `-`.
///
/// # Errors
///
/// Returns `RegistError::InvalidDigest` if `hex_digest` is empty, contains
/// non-hex characters, or its length is not a multiple of [`GROUP_LEN`].
pub fn format_activation_key(hex_digest: &str) -> RegistResult<String> {
    if hex_digest.is_empty() || hex_digest.len() % GROUP_LEN != 0 {
        return Err(RegistError::InvalidDigest(format!(
            "length {} is not a positive multiple of {GROUP_LEN}",
            hex_digest.len()
        )));
    }
    if !hex_digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RegistError::InvalidDigest(
            "digest contains non-hex characters".to_string(),
        ));
    }

    Ok(group_hex(hex_digest))
}

fn group_hex(hex_digest: &str) -> String {
    let groups: Vec<&str> = hex_digest
        .as_bytes()
        .chunks(GROUP_LEN)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    groups.join("-")
}

/// Encode text the way legacy clients hash it: one byte per UTF-16 code
/// unit, anything outside ASCII becomes `?` (so a surrogate pair yields `??`).
fn ascii_bytes(text: &str) -> impl Iterator<Item = u8> + '_ {
    text.encode_utf16()
        .map(|unit| u8::try_from(unit).ok().filter(u8::is_ascii).unwrap_or(b'?'))
}

/// Derive the activation key for a fingerprint and verified serial.
pub fn compute_activation_key(fingerprint: &str, serial: &RawSerial) -> String {
    let mut hasher = Sha256::new();
    let bytes: Vec<u8> = ascii_bytes(fingerprint)
        .chain(serial.as_str().bytes())
        .collect();
    hasher.update(&bytes);
    group_hex(&hex::encode_upper(hasher.finalize()))
}

/// Check that `key` looks like a formatted SHA-256 activation key.
pub fn is_activation_key(key: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[0-9A-F]{4}(-[0-9A-F]{4}){15}$").expect("activation key pattern is valid")
        })
        .is_match(key)
}
