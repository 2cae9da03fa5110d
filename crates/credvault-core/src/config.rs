//! Data directory resolution and on-disk layout
//!
//! Everything the store writes lives in one directory:
//! - `.key` - raw 32-byte master key
//! - `credentials.enc` - JSON array of encrypted credentials
//! - `credentials.enc.tmp` - staging file for atomic writes

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, VaultError};

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "CREDVAULT_DATA_DIR";

/// Master key file name
pub const KEY_FILE_NAME: &str = ".key";

/// Credential collection file name
pub const COLLECTION_FILE_NAME: &str = "credentials.enc";

/// Suffix appended to the collection file name while staging a write
pub const TEMP_SUFFIX: &str = ".tmp";

/// Resolved file layout for one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    data_dir: PathBuf,
}

impl StoreConfig {
    /// Use the given directory as-is
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Use the given directory, or fall back to [`app_data_dir`]
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        match data_dir {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(Self::new(dir)),
            _ => app_data_dir().map(Self::new),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn key_path(&self) -> PathBuf {
        self.data_dir.join(KEY_FILE_NAME)
    }

    pub fn collection_path(&self) -> PathBuf {
        self.data_dir.join(COLLECTION_FILE_NAME)
    }

    pub fn temp_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", COLLECTION_FILE_NAME, TEMP_SUFFIX))
    }
}

/// Get the application data directory.
///
/// `CREDVAULT_DATA_DIR` wins when set and non-empty; otherwise the
/// platform data directory is used.
pub fn app_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        debug!("Using data directory from {}: {:?}", DATA_DIR_ENV, dir);
        return Ok(PathBuf::from(dir));
    }

    ProjectDirs::from("com", "credvault", "credvault")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            VaultError::StorageError("Could not determine data directory".to_string())
        })
}

/// Create the data directory if needed and restrict it to the owner
pub fn ensure_data_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(path)?;
        // DirBuilder leaves an existing directory's mode alone
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    }

    #[cfg(not(unix))]
    std::fs::create_dir_all(path)?;

    debug!("Data directory ready at {:?}", path);
    Ok(())
}
