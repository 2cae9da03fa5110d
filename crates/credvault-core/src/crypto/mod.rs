//! Cryptographic primitives for the credential store
//!
//! This module provides:
//! - The AES-256-GCM [`Crypto`] engine bound to one key
//! - Master key generation and base64 backup encoding
//! - Argon2id key derivation from passwords
//! - Zeroize-on-drop key material
//! - A diagnostic machine identifier

mod cipher;
mod key_derivation;
mod keys;
mod machine_id;
mod secure_memory;

pub use cipher::{Crypto, NONCE_LEN, TAG_LEN};
pub use key_derivation::{derive_key, generate_salt, KeyDerivationParams};
pub use keys::{decode_key, encode_key, generate_key};
pub use machine_id::machine_id;
pub use secure_memory::{MasterKey, KEY_LEN};
