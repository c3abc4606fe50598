//! AES-256-GCM framing for the command file.
//!
//! Layout: `[12-byte nonce][ciphertext][16-byte tag]`.

use crate::error::file_channel::FileChannelError;

use common::ErrorLocation;

use std::fmt;
use std::panic::Location;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const MIN_ENCRYPTED_LEN: usize = NONCE_LEN + TAG_LEN;

/// Cipher keyed for one command channel.
#[derive(Clone)]
pub struct ChannelCipher {
    cipher: Aes256Gcm,
}

impl ChannelCipher {
    /// Key from standard base64. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FileChannelError::InvalidKey`] unless the text decodes to
    /// exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, FileChannelError> {
        let key = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|e| {
            FileChannelError::InvalidKey {
                message: format!("Key is not valid base64: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }
        })?);
        Self::from_bytes(&key)
    }

    pub fn from_bytes(key: &[u8]) -> Result<Self, FileChannelError> {
        if key.len() != KEY_LEN {
            return Err(FileChannelError::InvalidKey {
                message: format!("Key must be {KEY_LEN} bytes, got {}", key.len()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| FileChannelError::InvalidKey {
            message: "Key rejected by cipher".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self { cipher })
    }

    /// Decrypt and authenticate one file image.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, FileChannelError> {
        if data.len() < MIN_ENCRYPTED_LEN {
            return Err(FileChannelError::Decrypt {
                message: format!(
                    "Encrypted data too short: {} bytes (minimum {MIN_ENCRYPTED_LEN})",
                    data.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| FileChannelError::Decrypt {
                message: "Authentication failed, data corrupted or wrong key".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Encrypt under a fresh random nonce and return the full file image.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, FileChannelError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| FileChannelError::Encrypt {
                message: "Encryption failed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl fmt::Debug for ChannelCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChannelCipher([REDACTED])")
    }
}
