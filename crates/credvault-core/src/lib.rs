//! # credvault-core
//!
//! Local encrypted store for remote platform credentials:
//! - AES-256-GCM encryption of each username/password envelope
//! - A per-directory master key, generated on first use and kept owner-only
//! - Whole-collection persistence with write-then-rename crash safety
//! - Credential management keyed by connection id

pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod storage;

pub use config::{app_data_dir, StoreConfig};
pub use credential::{Connection, CredentialInfo, CredentialManager, EncryptedCredential};
pub use crypto::{decode_key, encode_key, generate_key, machine_id, Crypto, MasterKey};
pub use error::{Result, VaultError};
pub use storage::{CredentialStorage, JsonFileStorage};
