//! Credential manager for CRUD operations

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use zeroize::Zeroize;

use super::types::{Connection, CredentialEnvelope, CredentialInfo, EncryptedCredential};
use crate::config::{ensure_data_dir, StoreConfig};
use crate::crypto::Crypto;
use crate::error::{Result, VaultError};
use crate::storage::{load_or_create_key, CredentialStorage, JsonFileStorage};

/// Credential manager bound to one data directory and its master key
pub struct CredentialManager {
    /// Engine holding the master key
    crypto: Crypto,
    /// Collection backend
    storage: Arc<dyn CredentialStorage>,
    /// Directory the store lives in (absent for injected backends)
    data_dir: Option<PathBuf>,
    /// Serializes load-modify-save sequences; reads share it
    lock: RwLock<()>,
}

impl CredentialManager {
    /// Open the store in `data_dir`, or in the application data directory.
    ///
    /// Creates the directory and the master key on first use.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let config = StoreConfig::resolve(data_dir)?;

        ensure_data_dir(config.data_dir())?;

        let key = load_or_create_key(&config.key_path())?;
        let storage = JsonFileStorage::new(&config);

        info!("Credential store opened at {:?}", config.data_dir());

        Ok(Self {
            crypto: Crypto::new(key),
            storage: Arc::new(storage),
            data_dir: Some(config.data_dir().to_path_buf()),
            lock: RwLock::new(()),
        })
    }

    /// Create a manager over an arbitrary backend
    pub fn with_storage(crypto: Crypto, storage: Arc<dyn CredentialStorage>) -> Self {
        debug!("Credential manager using {}", storage.backend_name());

        Self {
            crypto,
            storage,
            data_dir: None,
            lock: RwLock::new(()),
        }
    }

    /// Get the data directory, if this manager owns one
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Encrypt and store the credentials of `conn`, replacing any record with
    /// the same id in place
    pub async fn save_connection(&self, conn: &Connection) -> Result<()> {
        let _guard = self.lock.write().await;

        let mut credentials = self.storage.load_all().await?;

        let envelope = CredentialEnvelope::new(&conn.username, &conn.password);
        let mut payload = serde_json::to_vec(&envelope)?;
        let encrypted = self.crypto.encrypt(&payload);
        payload.zeroize();

        let record = EncryptedCredential::from_connection(conn, encrypted?);

        match credentials.iter_mut().find(|c| c.id == conn.id) {
            Some(existing) => *existing = record,
            None => credentials.push(record),
        }

        self.storage.save_all(&credentials).await?;

        info!("Saved credential for connection {}", conn.id);
        Ok(())
    }

    /// Decrypt the stored credentials for `conn.id` into `conn`.
    ///
    /// `conn` is left untouched on any failure.
    pub async fn load_connection(&self, conn: &mut Connection) -> Result<()> {
        let _guard = self.lock.read().await;

        let credentials = self.storage.load_all().await?;
        let record = credentials
            .iter()
            .find(|c| c.id == conn.id)
            .ok_or(VaultError::CredentialNotFound(conn.id))?;

        let mut plaintext = self.crypto.decrypt(&record.encrypted_data)?;
        let envelope = serde_json::from_slice::<CredentialEnvelope>(&plaintext);
        plaintext.zeroize();
        let envelope = envelope?;

        conn.username = envelope.username().to_string();
        conn.password = envelope.password().to_string();

        debug!("Loaded credential for connection {}", conn.id);
        Ok(())
    }

    /// List every stored credential without decrypting anything
    pub async fn load_all_credentials(&self) -> Result<Vec<CredentialInfo>> {
        let _guard = self.lock.read().await;

        let credentials = self.storage.load_all().await?;
        Ok(credentials.iter().map(CredentialInfo::from).collect())
    }

    /// Check whether a credential is stored for `id`
    pub async fn has_credential(&self, id: u64) -> Result<bool> {
        let _guard = self.lock.read().await;

        let credentials = self.storage.load_all().await?;
        Ok(credentials.iter().any(|c| c.id == id))
    }

    /// Delete the credential for `id`. Deleting a missing id is not an error.
    pub async fn delete_credential(&self, id: u64) -> Result<()> {
        let _guard = self.lock.write().await;

        let mut credentials = self.storage.load_all().await?;
        let before = credentials.len();
        credentials.retain(|c| c.id != id);

        self.storage.save_all(&credentials).await?;

        if credentials.len() < before {
            info!("Deleted credential for connection {}", id);
        } else {
            debug!("No credential for connection {} to delete", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn test_manager() -> (TempDir, CredentialManager) {
        let temp_dir = TempDir::new().unwrap();
        let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
        (temp_dir, manager)
    }

    fn connection(id: u64, username: &str, password: &str) -> Connection {
        Connection {
            id,
            name: format!("cluster-{}", id),
            platform: "vcenter".to_string(),
            host: "vc.example.internal".to_string(),
            port: 443,
            username: username.to_string(),
            password: password.to_string(),
            insecure: true,
        }
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let (_dir, manager) = test_manager();

        assert!(manager.load_all_credentials().await.unwrap().is_empty());

        manager.save_connection(&connection(1, "u", "p")).await.unwrap();

        let infos = manager.load_all_credentials().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].id, 1);
        assert_eq!(infos[0].username, "u");

        let mut conn = Connection::with_id(1);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.username, "u");
        assert_eq!(conn.password, "p");

        manager.delete_credential(1).await.unwrap();

        let mut conn = Connection::with_id(1);
        let err = manager.load_connection(&mut conn).await.unwrap_err();
        assert!(matches!(err, VaultError::CredentialNotFound(1)));
    }

    #[tokio::test]
    async fn test_save_replaces_in_place() {
        let (_dir, manager) = test_manager();

        for id in 1..=3 {
            manager.save_connection(&connection(id, "admin", "old")).await.unwrap();
        }
        manager.save_connection(&connection(2, "root", "new")).await.unwrap();

        let infos = manager.load_all_credentials().await.unwrap();
        let ids: Vec<u64> = infos.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(infos[1].username, "root");

        let mut conn = Connection::with_id(2);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.username, "root");
        assert_eq!(conn.password, "new");
    }

    #[tokio::test]
    async fn test_load_fills_only_credentials() {
        let (_dir, manager) = test_manager();
        manager.save_connection(&connection(5, "svc", "pw")).await.unwrap();

        let mut conn = Connection {
            name: "caller-owned".to_string(),
            ..Connection::with_id(5)
        };
        manager.load_connection(&mut conn).await.unwrap();

        assert_eq!(conn.name, "caller-owned");
        assert_eq!(conn.host, "");
        assert_eq!(conn.username, "svc");
        assert_eq!(conn.password, "pw");
    }

    #[tokio::test]
    async fn test_empty_password_roundtrip() {
        let (_dir, manager) = test_manager();
        manager.save_connection(&connection(1, "guest", "")).await.unwrap();

        let mut conn = Connection::with_id(1);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.username, "guest");
        assert_eq!(conn.password, "");
    }

    #[tokio::test]
    async fn test_password_never_on_disk_in_plaintext() {
        let (dir, manager) = test_manager();
        manager
            .save_connection(&connection(1, "admin", "Sup3r-Secret-Pw"))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(dir.path().join("credentials.enc")).unwrap();
        assert!(!contents.contains("Sup3r-Secret-Pw"));
        assert!(contents.contains("\"encryptedData\""));
        assert!(contents.contains("\"username\": \"admin\""));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, manager) = test_manager();

        // nothing stored yet
        manager.delete_credential(42).await.unwrap();

        manager.save_connection(&connection(1, "u", "p")).await.unwrap();
        manager.delete_credential(99).await.unwrap();
        manager.delete_credential(99).await.unwrap();

        let infos = manager.load_all_credentials().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].id, 1);
    }

    #[tokio::test]
    async fn test_has_credential() {
        let (_dir, manager) = test_manager();

        assert!(!manager.has_credential(1).await.unwrap());
        manager.save_connection(&connection(1, "u", "p")).await.unwrap();
        assert!(manager.has_credential(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        {
            let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
            manager.save_connection(&connection(7, "ops", "pw7")).await.unwrap();
        }

        {
            let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
            assert_eq!(manager.data_dir(), Some(temp_dir.path()));

            let mut conn = Connection::with_id(7);
            manager.load_connection(&mut conn).await.unwrap();
            assert_eq!(conn.password, "pw7");
        }
    }

    #[tokio::test]
    async fn test_foreign_key_cannot_decrypt() {
        let (dir_a, manager_a) = test_manager();
        let (dir_b, manager_b) = test_manager();

        manager_a.save_connection(&connection(1, "u", "p")).await.unwrap();
        std::fs::copy(
            dir_a.path().join("credentials.enc"),
            dir_b.path().join("credentials.enc"),
        )
        .unwrap();

        // listing needs no key
        assert_eq!(manager_b.load_all_credentials().await.unwrap().len(), 1);

        let mut conn = Connection::with_id(1);
        let err = manager_b.load_connection(&mut conn).await.unwrap_err();
        assert!(err.is_decryption_failure());
        assert_eq!(conn.username, "");
        assert_eq!(conn.password, "");
    }

    #[tokio::test]
    async fn test_corrupt_store_surfaces() {
        let (dir, manager) = test_manager();
        let path = dir.path().join("credentials.enc");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            manager.load_all_credentials().await.unwrap_err(),
            VaultError::CorruptStore { .. }
        ));
        assert!(matches!(
            manager.save_connection(&connection(1, "u", "p")).await.unwrap_err(),
            VaultError::CorruptStore { .. }
        ));
        assert!(matches!(
            manager.delete_credential(1).await.unwrap_err(),
            VaultError::CorruptStore { .. }
        ));

        // never auto-repaired
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_interrupted_write_leaves_original_readable() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
        manager.save_connection(&connection(1, "u", "p")).await.unwrap();
        drop(manager);

        // staging file written, process died before the rename
        let temp_path = temp_dir.path().join("credentials.enc.tmp");
        std::fs::write(&temp_path, "[{\"id\": 2, \"name\": \"half").unwrap();

        let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
        let infos = manager.load_all_credentials().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].id, 1);

        let mut conn = Connection::with_id(1);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.password, "p");

        manager.save_connection(&connection(2, "v", "q")).await.unwrap();
        assert!(!temp_path.exists());
        assert_eq!(manager.load_all_credentials().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_key_file_fails_construction() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".key"), b"too short").unwrap();

        let err = CredentialManager::new(Some(temp_dir.path().to_path_buf())).err();
        assert!(matches!(err, Some(VaultError::InvalidKey(9))));
    }

    #[tokio::test]
    async fn test_interrupted_key_provisioning_recovers() {
        let temp_dir = TempDir::new().unwrap();
        // created but never written
        std::fs::write(temp_dir.path().join(".key"), b"").unwrap();

        let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
        manager.save_connection(&connection(1, "u", "p")).await.unwrap();
        drop(manager);

        let manager = CredentialManager::new(Some(temp_dir.path().to_path_buf())).unwrap();
        let mut conn = Connection::with_id(1);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.password, "p");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_are_not_lost() {
        let (_dir, manager) = test_manager();
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..16u64)
            .map(|id| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .save_connection(&connection(id, "user", &format!("pw-{}", id)))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let infos = manager.load_all_credentials().await.unwrap();
        assert_eq!(infos.len(), 16);

        let mut conn = Connection::with_id(11);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.password, "pw-11");
    }

    /// In-memory backend for exercising the manager without a filesystem
    #[derive(Default)]
    struct MemoryStorage {
        records: Mutex<Vec<EncryptedCredential>>,
    }

    #[async_trait]
    impl CredentialStorage for MemoryStorage {
        async fn load_all(&self) -> Result<Vec<EncryptedCredential>> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn save_all(&self, credentials: &[EncryptedCredential]) -> Result<()> {
            *self.records.lock().unwrap() = credentials.to_vec();
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "Memory Storage"
        }
    }

    #[tokio::test]
    async fn test_with_storage_backend() {
        let storage = Arc::new(MemoryStorage::default());
        let crypto = Crypto::from_key(&[9u8; 32]).unwrap();
        let manager = CredentialManager::with_storage(crypto, storage.clone());

        assert!(manager.data_dir().is_none());

        manager.save_connection(&connection(3, "alice", "pw")).await.unwrap();

        let stored = storage.records.lock().unwrap().clone();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].username, "alice");
        assert!(!stored[0].encrypted_data.is_empty());

        let mut conn = Connection::with_id(3);
        manager.load_connection(&mut conn).await.unwrap();
        assert_eq!(conn.password, "pw");
    }
}
