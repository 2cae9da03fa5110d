//! JSON file storage backend
//!
//! Keeps the whole collection in one pretty-printed JSON array. Writes go to
//! a sibling `.tmp` file which is then renamed over the real one, so readers
//! only ever see the previous or the next complete collection.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::CredentialStorage;
use crate::config::StoreConfig;
use crate::credential::EncryptedCredential;
use crate::error::{Result, VaultError};

/// Collection file storage backend
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    /// Authoritative collection file
    path: PathBuf,
    /// Staging file for atomic replacement
    temp_path: PathBuf,
}

impl JsonFileStorage {
    /// Create a backend over the collection file of `config`
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            path: config.collection_path(),
            temp_path: config.temp_path(),
        }
    }

    /// Get the collection file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_staged(&self, contents: &[u8]) -> Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStorage for JsonFileStorage {
    async fn load_all(&self) -> Result<Vec<EncryptedCredential>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No existing credential file found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let credentials: Vec<EncryptedCredential> =
            serde_json::from_slice(&contents).map_err(|e| VaultError::CorruptStore {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!("Loaded {} credentials from storage", credentials.len());
        Ok(credentials)
    }

    async fn save_all(&self, credentials: &[EncryptedCredential]) -> Result<()> {
        let contents = serde_json::to_vec_pretty(credentials)?;

        let staged = match self.write_staged(&contents).await {
            Ok(()) => tokio::fs::rename(&self.temp_path, &self.path)
                .await
                .map_err(VaultError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = staged {
            if let Err(cleanup) = tokio::fs::remove_file(&self.temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Could not remove staging file {:?}: {}", self.temp_path, cleanup);
                }
            }
            return Err(e);
        }

        debug!("Saved {} credentials to storage", credentials.len());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Storage"
    }
}
