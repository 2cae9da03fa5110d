//! Credential type definitions

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A connection to a remote platform, owned by the caller's storage layer.
///
/// The credential store only reads and writes `username` and `password`,
/// joining on `id`; the remaining fields are copied into the record for
/// display.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub id: u64,
    pub name: String,
    pub platform: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub insecure: bool,
}

impl Connection {
    /// Create a connection reference carrying only its id, ready to be filled
    /// by [`CredentialManager::load_connection`](super::CredentialManager::load_connection)
    pub fn with_id(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("insecure", &self.insecure)
            .finish()
    }
}

/// Stored credential (one element of the on-disk collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedCredential {
    pub id: u64,
    pub name: String,
    pub platform: String,
    pub host: String,
    pub port: u16,
    /// Display copy; the encrypted envelope is authoritative
    pub username: String,
    /// base64(nonce || ciphertext || tag) of a [`CredentialEnvelope`]
    pub encrypted_data: String,
    pub insecure: bool,
}

impl EncryptedCredential {
    /// Build a record for `conn` around an already encrypted envelope
    pub fn from_connection(conn: &Connection, encrypted_data: String) -> Self {
        Self {
            id: conn.id,
            name: conn.name.clone(),
            platform: conn.platform.clone(),
            host: conn.host.clone(),
            port: conn.port,
            username: conn.username.clone(),
            encrypted_data,
            insecure: conn.insecure,
        }
    }
}

/// Credential metadata (safe to display)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub id: u64,
    pub name: String,
    pub platform: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub insecure: bool,
}

impl From<&EncryptedCredential> for CredentialInfo {
    fn from(cred: &EncryptedCredential) -> Self {
        Self {
            id: cred.id,
            name: cred.name.clone(),
            platform: cred.platform.clone(),
            host: cred.host.clone(),
            port: cred.port,
            username: cred.username.clone(),
            insecure: cred.insecure,
        }
    }
}

/// The plaintext that gets encrypted into `encrypted_data` - zeroed on drop
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialEnvelope {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

impl CredentialEnvelope {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password (use carefully)
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for CredentialEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEnvelope")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
