//! Raw DEFLATE compression (no zlib or gzip header).

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::errors::{RegistError, RegistResult};

/// Maximum output size for decompression.
///
/// Request payloads are small encrypted fingerprints; anything inflating past
/// this is treated as a malformed stream.
pub const MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024;

/// Compresses `data` into a raw DEFLATE stream.
///
/// # Errors
/// Returns `RegistError::CompressionError` if the encoder fails.
pub fn compress(data: &[u8]) -> RegistResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RegistError::CompressionError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| RegistError::CompressionError(e.to_string()))
}

/// Inflates a raw DEFLATE stream.
///
/// # Errors
/// Returns `RegistError::DecompressionError` if the stream is malformed
/// or inflates beyond [`MAX_DECOMPRESSED_SIZE`].
pub fn decompress(data: &[u8]) -> RegistResult<Vec<u8>> {
    let mut out = Vec::new();
    // One extra byte distinguishes "exactly at the limit" from "over it".
    let mut limited = DeflateDecoder::new(data).take(MAX_DECOMPRESSED_SIZE as u64 + 1);
    limited
        .read_to_end(&mut out)
        .map_err(|e| RegistError::DecompressionError(e.to_string()))?;

    if out.len() > MAX_DECOMPRESSED_SIZE {
        return Err(RegistError::DecompressionError(format!(
            "output exceeds {MAX_DECOMPRESSED_SIZE} bytes"
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_various_inputs() {
        let inputs: [&[u8]; 4] = [b"", b"a", b"hello hello hello hello", &[0u8; 4096]];
        for input in inputs {
            let compressed = compress(input).expect("compress");
            assert_eq!(decompress(&compressed).expect("decompress"), input);
        }
    }

    #[test]
    fn repetitive_input_shrinks() {
        let input = vec![b'A'; 10_000];
        let compressed = compress(&input).expect("compress");
        assert!(compressed.len() < input.len() / 10);
    }

    #[test]
    fn rejects_invalid_block_type() {
        // BFINAL=1, BTYPE=11 (reserved) is never valid.
        let result = decompress(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(RegistError::DecompressionError(_))));
    }

    #[test]
    fn rejects_oversized_output() {
        let input = vec![0u8; MAX_DECOMPRESSED_SIZE + 10];
        let compressed = compress(&input).expect("compress");
        assert!(decompress(&compressed).is_err());
    }
}
