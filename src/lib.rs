//! Regist - a line-oriented TCP activation endpoint
//!
//! Clients send `RRC,<payload>,<serial>` where the payload is an encrypted,
//! DEFLATE-compressed device fingerprint and the serial is an 8-digit
//! checksum-protected serial number. The server answers with a dashed
//! SHA-256 activation key or an error token naming the failing stage.
//!
//! # Features
//!
//! - `server` - TCP server (session framing, accept loop, logging). Enabled by default.
//!
//! # Example
//!
//! ```rust
//! use regist::codec::Codec;
//! use regist::pipeline::ActivationPipeline;
//! use regist::client::request::build_request_for_raw_serial;
//!
//! let codec = Codec::default();
//! let line = build_request_for_raw_serial(&codec, "SYS123", "456789").unwrap();
//! let token = ActivationPipeline::new(codec).evaluate(&line);
//! assert!(token.is_activated());
//! ```

// Core modules (always available)
pub mod activation_key;
pub mod codec;
pub mod compression;
pub mod config;
pub mod encryption;
pub mod errors;
pub mod pipeline;
pub mod protocol;
pub mod serial_number;

// Client-related modules (always available)
pub mod client {
    pub mod connection;
    pub mod request;

    pub use connection::ActivationClient;
}

// Server-related modules (requires "server" feature)
#[cfg(feature = "server")]
#[path = "server/mod.rs"]
pub mod server;
