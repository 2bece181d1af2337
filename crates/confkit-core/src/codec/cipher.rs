//! Symmetric encryption for stores written in encrypted mode.
//!
//! Envelope layout:
//! ```text
//! [nonce:12][AES-256-GCM ciphertext + tag:N]
//! ```
//! A fresh random nonce is drawn for every write, so sealing the same
//! document twice yields different bytes.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::codec::CodecError;

/// Size of the nonce prefix in bytes.
pub const NONCE_SIZE: usize = 12;

/// A 256-bit key, fixed for the lifetime of a store.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives a key from a passphrase with SHA-256.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self(key)
    }

    /// Encrypts `plaintext` into a nonce-prefixed envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encryption`] if the cipher rejects the input.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = Aes256Gcm::new(&self.0.into());
        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CodecError::Encryption(e.to_string()))?;

        let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(envelope)
    }

    /// Decrypts an envelope produced by [`EncryptionKey::seal`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InsufficientData`] for envelopes shorter than the
    /// nonce and [`CodecError::Decryption`] when authentication fails.
    pub fn open(&self, envelope: &[u8]) -> Result<Vec<u8>, CodecError> {
        if envelope.len() < NONCE_SIZE {
            return Err(CodecError::InsufficientData {
                needed: NONCE_SIZE,
                available: envelope.len(),
            });
        }
        let (nonce, ciphertext) = envelope.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new(&self.0.into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CodecError::Decryption(e.to_string()))
    }
}

// Never print key material.
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
