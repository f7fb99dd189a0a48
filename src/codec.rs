//! Codec adapter: compression plus symmetric encryption behind one handle.
//!
//! The pipeline and the client only ever talk to [`Codec`]; the primitives
//! live in [`crate::compression`] and [`crate::encryption`].

use std::sync::Arc;

use crate::compression;
use crate::config::CryptoConfig;
use crate::encryption::{self, KeyProvider, StaticKeyProvider};
use crate::errors::RegistResult;

/// Compress/decompress and encrypt/decrypt with a fixed key provider.
#[derive(Clone)]
pub struct Codec {
    keys: Arc<dyn KeyProvider>,
}

impl Codec {
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self { keys }
    }

    /// Codec using the key material from configuration.
    pub fn from_config(config: &CryptoConfig) -> RegistResult<Self> {
        let keys = StaticKeyProvider::try_from(config)?;
        Ok(Self::new(Arc::new(keys)))
    }

    pub fn compress(&self, data: &[u8]) -> RegistResult<Vec<u8>> {
        compression::compress(data)
    }

    pub fn decompress(&self, data: &[u8]) -> RegistResult<Vec<u8>> {
        compression::decompress(data)
    }

    /// Encrypt text, returning base64 ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> String {
        encryption::encrypt_to_base64(plaintext, self.keys.as_ref())
    }

    /// Decrypt base64 ciphertext back to text.
    pub fn decrypt(&self, ciphertext_b64: &str) -> RegistResult<String> {
        encryption::decrypt_from_base64(ciphertext_b64, self.keys.as_ref())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Arc::new(StaticKeyProvider::default()))
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}
