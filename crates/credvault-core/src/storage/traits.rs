//! Storage trait definitions

use crate::credential::EncryptedCredential;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for backends that persist the encrypted credential collection.
///
/// Implementations move the whole collection at once; callers hold their own
/// lock around a load-modify-save sequence.
#[async_trait]
pub trait CredentialStorage: Send + Sync {
    /// Read every stored record. A store that has never been written is empty.
    async fn load_all(&self) -> Result<Vec<EncryptedCredential>>;

    /// Replace the stored collection with `credentials`
    async fn save_all(&self, credentials: &[EncryptedCredential]) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
