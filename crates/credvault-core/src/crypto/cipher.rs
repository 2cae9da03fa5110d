//! AES-256-GCM authenticated encryption bound to one key
//!
//! Encryption format: `base64(nonce || ciphertext || auth_tag)`
//! - Nonce: 12 bytes (96 bits), fresh from the OS RNG on every call
//! - Ciphertext: same length as the plaintext
//! - Auth tag: 16 bytes (128 bits), appended by aes-gcm

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::key_derivation::{derive_key, KeyDerivationParams};
use super::MasterKey;
use crate::error::{Result, VaultError};

/// Nonce length for AES-GCM
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for AES-GCM
pub const TAG_LEN: usize = 16;

/// Encryption engine holding a single 256-bit key
#[derive(Debug, Clone)]
pub struct Crypto {
    key: MasterKey,
}

impl Crypto {
    /// Bind an engine to an existing master key
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Create from raw key bytes (must be exactly 32 bytes)
    pub fn from_key(key: &[u8]) -> Result<Self> {
        MasterKey::from_slice(key).map(Self::new)
    }

    /// Create from a password using a single unsalted SHA-256 pass.
    ///
    /// Deterministic: the same password always yields the same key. Only
    /// suitable for high-entropy secrets; use [`Crypto::from_password_with_salt`]
    /// for anything a person typed.
    pub fn from_password(password: &str) -> Result<Self> {
        if password.is_empty() {
            return Err(VaultError::InvalidArgument(
                "password cannot be empty".to_string(),
            ));
        }

        let mut digest = Sha256::digest(password.as_bytes());
        let key = MasterKey::from_slice(digest.as_slice());
        digest.as_mut_slice().zeroize();

        key.map(Self::new)
    }

    /// Create from a password using Argon2id and a stored salt
    pub fn from_password_with_salt(
        password: &str,
        salt: &str,
        params: Option<KeyDerivationParams>,
    ) -> Result<Self> {
        if password.is_empty() {
            return Err(VaultError::InvalidArgument(
                "password cannot be empty".to_string(),
            ));
        }

        derive_key(password, salt, params).map(Self::new)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_bytes())
            .map_err(|_| VaultError::InvalidKey(self.key.as_bytes().len()))
    }

    /// Encrypt bytes and return the base64 text form.
    ///
    /// Empty input yields an empty string.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let cipher = self.cipher()?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| VaultError::EncryptionError(format!("Nonce generation failed: {}", e)))?;

        // aes-gcm appends the auth tag to the ciphertext
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);

        Ok(BASE64.encode(payload))
    }

    /// Encrypt a string and return the base64 text form
    pub fn encrypt_string(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt the base64 text form back to bytes.
    ///
    /// Empty input yields empty bytes. Any authentication failure is an
    /// error; partially decrypted data is never returned.
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }

        let data = BASE64.decode(encoded)?;
        if data.len() < NONCE_LEN {
            return Err(VaultError::InvalidCiphertext);
        }

        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let cipher = self.cipher()?;

        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| VaultError::DecryptionError("authentication failed".to_string()))
    }

    /// Decrypt the base64 text form and return it as a string
    pub fn decrypt_string(&self, encoded: &str) -> Result<String> {
        let plaintext = self.decrypt(encoded)?;
        Ok(String::from_utf8(plaintext)?)
    }
}
