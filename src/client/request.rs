//! Building activation requests.

use crate::codec::Codec;
use crate::errors::{RegistError, RegistResult};
use crate::protocol::{to_hyphenated_hex, REQUEST_TAG};
use crate::serial_number::encode_serial;

/// Build the request line (without newline) for a fingerprint and encoded serial.
///
/// The fingerprint is encrypted, the base64 ciphertext compressed, and the
/// result rendered as hyphen-separated uppercase hex.
pub fn build_request(
    codec: &Codec,
    fingerprint: &str,
    encoded_serial: &str,
) -> RegistResult<String> {
    if fingerprint.is_empty() {
        return Err(RegistError::ProtocolError(
            "fingerprint cannot be empty".to_string(),
        ));
    }
    let cipher_text = codec.encrypt(fingerprint);
    let packed = codec.compress(cipher_text.as_bytes())?;
    Ok(format!(
        "{REQUEST_TAG},{},{encoded_serial}",
        to_hyphenated_hex(&packed)
    ))
}

/// Like [`build_request`], starting from a raw 6-digit serial.
pub fn build_request_for_raw_serial(
    codec: &Codec,
    fingerprint: &str,
    raw_serial: &str,
) -> RegistResult<String> {
    let encoded = encode_serial(raw_serial).ok_or_else(|| {
        RegistError::ProtocolError(format!("'{raw_serial}' is not a 6-digit serial"))
    })?;
    build_request(codec, fingerprint, &encoded)
}
