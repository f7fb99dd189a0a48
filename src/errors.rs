//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised by configuration, codecs and transport.
#[derive(Debug, Error)]
pub enum RegistError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("compression error: {0}")]
    CompressionError(String),

    #[error("decompression error: {0}")]
    DecompressionError(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RegistResult<T> = Result<T, RegistError>;
