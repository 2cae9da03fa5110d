//! Credential management for remote platform connections

mod manager;
mod types;

pub use manager::CredentialManager;
pub use types::*;
