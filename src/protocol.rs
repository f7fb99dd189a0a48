//! Wire vocabulary of the activation protocol.
//!
//! Requests and responses are single UTF-8 lines terminated by `\n`:
//!
//! ```text
//! -> RRC,<hex payload, hyphens allowed>,<8-digit encoded serial>
//! <- 1A2B-3C4D-...   | BADFORMAT | BADSN | BADINFO01 | BADINFO02 | BADINFO03
//! ```

use std::fmt;

use thiserror::Error;

/// Tag every request must start with.
pub const REQUEST_TAG: &str = "RRC";

/// First byte of the two-byte disconnect message.
pub const DISCONNECT_BYTE: u8 = b'X';

/// The line a client sends to end its session.
pub const DISCONNECT_MESSAGE: &[u8; 2] = b"X\n";

/// A request split into its three fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolEnvelope<'a> {
    pub hex_payload: &'a str,
    pub encoded_serial: &'a str,
}

impl<'a> ProtocolEnvelope<'a> {
    /// Split `line` on `,`; exactly three fields with the `RRC` tag are required.
    pub fn parse(line: &'a str) -> Result<Self, Rejection> {
        let fields: Vec<&str> = line.split(',').collect();
        match fields[..] {
            [tag, hex_payload, encoded_serial] if tag == REQUEST_TAG => Ok(Self {
                hex_payload,
                encoded_serial,
            }),
            _ => Err(Rejection::BadFormat),
        }
    }
}

/// Why a request was refused, one variant per pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("request is not a three-field RRC line")]
    BadFormat,
    #[error("serial number failed checksum validation")]
    BadSerial,
    #[error("payload is not valid hex")]
    BadHex,
    #[error("payload is not a valid deflate stream")]
    BadCompression,
    #[error("payload could not be decrypted")]
    BadCipher,
}

impl Rejection {
    /// The token written back to the client.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::BadFormat => "BADFORMAT",
            Rejection::BadSerial => "BADSN",
            Rejection::BadHex => "BADINFO01",
            Rejection::BadCompression => "BADINFO02",
            Rejection::BadCipher => "BADINFO03",
        }
    }

    /// Parse a wire token back into a rejection.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BADFORMAT" => Some(Rejection::BadFormat),
            "BADSN" => Some(Rejection::BadSerial),
            "BADINFO01" => Some(Rejection::BadHex),
            "BADINFO02" => Some(Rejection::BadCompression),
            "BADINFO03" => Some(Rejection::BadCipher),
            _ => None,
        }
    }
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseToken {
    Activated(String),
    Rejected(Rejection),
}

impl ResponseToken {
    pub fn is_activated(&self) -> bool {
        matches!(self, ResponseToken::Activated(_))
    }

    /// Short label safe to log (never the key itself).
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseToken::Activated(_) => "ACTIVATED",
            ResponseToken::Rejected(r) => r.code(),
        }
    }
}

impl From<Result<String, Rejection>> for ResponseToken {
    fn from(result: Result<String, Rejection>) -> Self {
        match result {
            Ok(key) => ResponseToken::Activated(key),
            Err(rejection) => ResponseToken::Rejected(rejection),
        }
    }
}

impl fmt::Display for ResponseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseToken::Activated(key) => f.write_str(key),
            ResponseToken::Rejected(rejection) => f.write_str(rejection.code()),
        }
    }
}

/// Render bytes as uppercase hex pairs separated by `-` (`0A-FF-3C`).
pub fn to_hyphenated_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_field_request() {
        let env = ProtocolEnvelope::parse("RRC,AB-CD,22413574").expect("valid");
        assert_eq!(env.hex_payload, "AB-CD");
        assert_eq!(env.encoded_serial, "22413574");
    }

    #[test]
    fn rejects_wrong_tag_or_field_count() {
        for line in ["FOO,a,b", "RRC,a", "RRC,a,b,c", "", "rrc,a,b", "RRC"] {
            assert_eq!(ProtocolEnvelope::parse(line), Err(Rejection::BadFormat), "{line}");
        }
    }

    #[test]
    fn empty_fields_still_parse() {
        let env = ProtocolEnvelope::parse("RRC,,").expect("three fields");
        assert_eq!(env.hex_payload, "");
        assert_eq!(env.encoded_serial, "");
    }

    #[test]
    fn codes_round_trip() {
        for r in [
            Rejection::BadFormat,
            Rejection::BadSerial,
            Rejection::BadHex,
            Rejection::BadCompression,
            Rejection::BadCipher,
        ] {
            assert_eq!(Rejection::from_code(r.code()), Some(r));
            assert_eq!(ResponseToken::Rejected(r).to_string(), r.code());
        }
        assert_eq!(Rejection::from_code("OK"), None);
    }

    #[test]
    fn hyphenated_hex_layout() {
        assert_eq!(to_hyphenated_hex(&[0x0a, 0xff, 0x3c]), "0A-FF-3C");
        assert_eq!(to_hyphenated_hex(&[]), "");
    }
}
