//! Seam for the external encryption collaborator.
//!
//! The store never encrypts or decrypts anything itself. It persists the
//! `encrypted` flag next to whatever content it is handed. Callers that want
//! encrypted items plug a [`Cipher`] in here before writing and after reading.

use thiserror::Error;

use crate::models::Item;

/// Failure reported by a [`Cipher`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Encryption error: {message}")]
pub struct EncryptionError {
    message: String,
}

impl EncryptionError {
    /// Creates an error with the collaborator's diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the collaborator's diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// String-to-string encryption capability supplied by the caller.
pub trait Cipher {
    /// Encrypts `plaintext` for the key identified by `key_id`.
    fn encrypt(&self, plaintext: &str, key_id: &str) -> Result<String, EncryptionError>;

    /// Decrypts `ciphertext` with whichever key it was produced for.
    fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError>;
}

impl Item {
    /// Replaces the content with its ciphertext and marks the item encrypted.
    ///
    /// Already-encrypted items are returned unchanged.
    pub fn seal(mut self, cipher: &dyn Cipher, key_id: &str) -> Result<Self, EncryptionError> {
        if !self.encrypted {
            self.content = cipher.encrypt(&self.content, key_id)?;
            self.encrypted = true;
        }
        Ok(self)
    }

    /// Replaces ciphertext content with plaintext and clears the flag.
    ///
    /// Plaintext items are returned unchanged.
    pub fn unseal(mut self, cipher: &dyn Cipher) -> Result<Self, EncryptionError> {
        if self.encrypted {
            self.content = cipher.decrypt(&self.content)?;
            self.encrypted = false;
        }
        Ok(self)
    }
}
