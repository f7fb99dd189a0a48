//! Symmetric encryption for client fingerprints.
//!
//! AES-256-CBC with PKCS#7 padding. Ciphertext travels as standard base64
//! text. Key and IV come from a [`KeyProvider`] so deployments and tests
//! can supply their own material.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::config::{CryptoConfig, LEGACY_AES_IV, LEGACY_AES_KEY};
use crate::errors::{RegistError, RegistResult};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// CBC initialization vector size in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// Source of the symmetric key and IV.
pub trait KeyProvider: Send + Sync {
    fn key(&self) -> [u8; KEY_SIZE];
    fn iv(&self) -> [u8; IV_SIZE];
}

/// Fixed key material held in memory.
#[derive(Clone)]
pub struct StaticKeyProvider {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl StaticKeyProvider {
    pub fn new(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Build from raw byte slices, checking their lengths.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> RegistResult<Self> {
        let key: [u8; KEY_SIZE] = key.try_into().map_err(|_| {
            RegistError::ConfigError(format!(
                "invalid key length: expected {} bytes, got {}",
                KEY_SIZE,
                key.len()
            ))
        })?;
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| {
            RegistError::ConfigError(format!(
                "invalid IV length: expected {} bytes, got {}",
                IV_SIZE,
                iv.len()
            ))
        })?;
        Ok(Self::new(key, iv))
    }
}

impl Default for StaticKeyProvider {
    /// The key material deployed clients were built with.
    fn default() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        key.copy_from_slice(LEGACY_AES_KEY.as_bytes());
        iv.copy_from_slice(LEGACY_AES_IV.as_bytes());
        Self { key, iv }
    }
}

impl TryFrom<&CryptoConfig> for StaticKeyProvider {
    type Error = RegistError;

    fn try_from(config: &CryptoConfig) -> RegistResult<Self> {
        Self::from_slices(config.key.as_bytes(), config.iv.as_bytes())
    }
}

impl std::fmt::Debug for StaticKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyProvider").finish_non_exhaustive()
    }
}

impl KeyProvider for StaticKeyProvider {
    fn key(&self) -> [u8; KEY_SIZE] {
        self.key
    }

    fn iv(&self) -> [u8; IV_SIZE] {
        self.iv
    }
}

/// Encrypt arbitrary bytes with AES-256-CBC / PKCS#7.
pub fn encrypt_bytes(plaintext: &[u8], keys: &dyn KeyProvider) -> Vec<u8> {
    Aes256CbcEnc::new(&keys.key().into(), &keys.iv().into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt bytes produced by [`encrypt_bytes`].
pub fn decrypt_bytes(ciphertext: &[u8], keys: &dyn KeyProvider) -> RegistResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % IV_SIZE != 0 {
        return Err(RegistError::DecryptionError(format!(
            "ciphertext length {} is not a positive multiple of the block size",
            ciphertext.len()
        )));
    }

    Aes256CbcDec::new(&keys.key().into(), &keys.iv().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| RegistError::DecryptionError(format!("decryption failed: {e}")))
}

/// Encrypt UTF-8 text and return a base64 string.
pub fn encrypt_to_base64(plaintext: &str, keys: &dyn KeyProvider) -> String {
    B64.encode(encrypt_bytes(plaintext.as_bytes(), keys))
}

/// Decrypt a base64 ciphertext previously produced by [`encrypt_to_base64`].
///
/// Spaces, tabs and line breaks inside the base64 text are ignored.
pub fn decrypt_from_base64(ciphertext_b64: &str, keys: &dyn KeyProvider) -> RegistResult<String> {
    let compact: String = ciphertext_b64
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
        .collect();
    let decoded = B64
        .decode(compact)
        .map_err(|e| RegistError::DecryptionError(format!("base64 decode failed: {e}")))?;
    let plaintext = decrypt_bytes(&decoded, keys)?;
    String::from_utf8(plaintext)
        .map_err(|e| RegistError::DecryptionError(format!("plaintext is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_encrypt_decrypt_bytes() {
        let keys = StaticKeyProvider::default();
        let data = b"hello regist encryption";

        let encrypted = encrypt_bytes(data, &keys);
        assert_ne!(encrypted, data, "ciphertext must differ from plaintext");
        assert_eq!(encrypted.len() % IV_SIZE, 0);

        let decrypted = decrypt_bytes(&encrypted, &keys).expect("decryption should succeed");
        assert_eq!(decrypted, data);
    }

    #[test]
    fn round_trip_base64_including_empty() {
        let keys = StaticKeyProvider::default();
        for text in ["", "SYS123", "マシン-ID/äöü"] {
            let encoded = encrypt_to_base64(text, &keys);
            let decoded = decrypt_from_base64(&encoded, &keys).expect("decryption should succeed");
            assert_eq!(decoded, text);
        }
    }

    #[test]
    fn empty_plaintext_is_one_padding_block() {
        let keys = StaticKeyProvider::default();
        assert_eq!(encrypt_bytes(b"", &keys).len(), IV_SIZE);
    }

    #[test]
    fn rejects_wrong_key_size() {
        assert!(StaticKeyProvider::from_slices(&[0u8; 16], &[0u8; IV_SIZE]).is_err());
        assert!(StaticKeyProvider::from_slices(&[0u8; KEY_SIZE], &[0u8; 8]).is_err());
    }

    #[test]
    fn wrong_key_does_not_yield_plaintext() {
        let keys = StaticKeyProvider::default();
        let other = StaticKeyProvider::new([7u8; KEY_SIZE], [9u8; IV_SIZE]);
        let encoded = encrypt_to_base64("fingerprint-data", &keys);

        match decrypt_from_base64(&encoded, &other) {
            Ok(text) => assert_ne!(text, "fingerprint-data"),
            Err(RegistError::DecryptionError(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn whitespace_in_base64_is_ignored() {
        let keys = StaticKeyProvider::default();
        let encoded = encrypt_to_base64("SYS123 wrapped", &keys);
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!(" {head}\r\n\t{tail} \n");

        let decoded = decrypt_from_base64(&wrapped, &keys).expect("whitespace is skipped");
        assert_eq!(decoded, "SYS123 wrapped");
    }

    #[test]
    fn rejects_truncated_and_non_base64_input() {
        let keys = StaticKeyProvider::default();
        assert!(decrypt_bytes(&[1, 2, 3], &keys).is_err());
        assert!(decrypt_bytes(&[], &keys).is_err());
        assert!(decrypt_from_base64("not base64!!", &keys).is_err());
    }
}
