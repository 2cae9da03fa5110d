//! Error types for credvault-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for credential store operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Credential store error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid key: expected 32 bytes, got {0}")]
    InvalidKey(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid ciphertext")]
    InvalidCiphertext,

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Decrypted payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationError(String),

    #[error("Base64 decoding failed: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Credential not found: {0}")]
    CredentialNotFound(u64),

    #[error("Credential already exists: {0}")]
    CredentialExists(u64),

    #[error("Credential store {path:?} is unreadable: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VaultError {
    /// True for every failure that means "this payload cannot be decrypted".
    ///
    /// Callers that surface errors outside the process should collapse these
    /// into one message; the individual variants are kept for diagnostics.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            VaultError::InvalidCiphertext
                | VaultError::DecryptionError(_)
                | VaultError::DecodeError(_)
        )
    }
}
