//! Master key generation and text encoding

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use super::secure_memory::KEY_LEN;
use super::MasterKey;
use crate::error::{Result, VaultError};

/// Generate a fresh 256-bit key from the OS RNG
pub fn generate_key() -> Result<MasterKey> {
    let mut bytes = [0u8; KEY_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultError::KeyGenerationError(e.to_string()))?;

    let key = MasterKey::new(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Encode a key as base64 text, for manual backup only
pub fn encode_key(key: &MasterKey) -> String {
    BASE64.encode(key.as_bytes())
}

/// Decode a key previously produced by [`encode_key`]
pub fn decode_key(encoded: &str) -> Result<MasterKey> {
    let mut bytes = BASE64.decode(encoded.trim())?;
    let key = MasterKey::from_slice(&bytes);
    bytes.zeroize();
    key
}
