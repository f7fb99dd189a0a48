//! Request validation pipeline.
//!
//! Turns one request line into one response token, stopping at the first
//! failing stage:
//!
//! 1. envelope shape            -> `BADFORMAT`
//! 2. serial checksum           -> `BADSN`
//! 3. hex payload               -> `BADINFO01`
//! 4. DEFLATE stream            -> `BADINFO02`
//! 5. AES decryption            -> `BADINFO03`
//! 6. SHA-256 + key formatting  -> activation key

use tracing::debug;

use crate::activation_key::compute_activation_key;
use crate::codec::Codec;
use crate::protocol::{ProtocolEnvelope, Rejection, ResponseToken};
use crate::serial_number::decode_serial;

/// Stateless evaluator for activation requests.
#[derive(Debug, Clone, Default)]
pub struct ActivationPipeline {
    codec: Codec,
}

impl ActivationPipeline {
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Evaluate a request line (without its trailing newline).
    pub fn evaluate(&self, line: &str) -> ResponseToken {
        let token = ResponseToken::from(self.activate(line));
        if let ResponseToken::Rejected(rejection) = &token {
            debug!(code = rejection.code(), reason = %rejection, "Request rejected");
        }
        token
    }

    /// Run every stage, returning the formatted activation key.
    pub fn activate(&self, line: &str) -> Result<String, Rejection> {
        let envelope = ProtocolEnvelope::parse(line)?;

        let serial = decode_serial(envelope.encoded_serial).ok_or(Rejection::BadSerial)?;

        let payload = hex::decode(envelope.hex_payload.replace('-', ""))
            .map_err(|_| Rejection::BadHex)?;

        let inflated = self
            .codec
            .decompress(&payload)
            .map_err(|_| Rejection::BadCompression)?;
        if inflated.is_empty() {
            return Err(Rejection::BadCompression);
        }

        let cipher_text = String::from_utf8(inflated).map_err(|_| Rejection::BadCipher)?;
        let fingerprint = self
            .codec
            .decrypt(&cipher_text)
            .map_err(|_| Rejection::BadCipher)?;
        if fingerprint.is_empty() {
            return Err(Rejection::BadCipher);
        }

        Ok(compute_activation_key(&fingerprint, &serial))
    }
}
