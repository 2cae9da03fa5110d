//! Master key file provisioning
//!
//! The key is stored as 32 raw bytes with owner-only permissions. A new key is
//! staged in `.key.tmp`, synced, then hard-linked into place, so `.key` is
//! either absent or complete. An existing key file is trusted as-is; it is
//! never rewritten or rotated.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::config::TEMP_SUFFIX;
use crate::crypto::{generate_key, MasterKey};
use crate::error::{Result, VaultError};

/// Read the master key at `path`, generating and persisting one if absent
pub fn load_or_create_key(path: &Path) -> Result<MasterKey> {
    if let Some(key) = read_key_file(path)? {
        debug!("Loaded master key from {:?}", path);
        return Ok(key);
    }

    let key = generate_key()?;

    match install_key_file(path, &key) {
        Ok(()) => {
            info!("Created new master key at {:?}", path);
            Ok(key)
        }
        // another opener won the create; use its key
        Err(VaultError::IoError(e)) if e.kind() == ErrorKind::AlreadyExists => read_key_file(path)?
            .ok_or_else(|| VaultError::StorageError(format!("Key file {:?} vanished", path))),
        Err(e) => Err(e),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(TEMP_SUFFIX);
    PathBuf::from(staged)
}

fn read_key_file(path: &Path) -> Result<Option<MasterKey>> {
    let mut bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    // zero bytes: provisioning died before writing, nothing was ever encrypted with it
    if bytes.is_empty() {
        warn!("Discarding empty master key file {:?}", path);
        std::fs::remove_file(path)?;
        return Ok(None);
    }

    let key = MasterKey::from_slice(&bytes);
    bytes.zeroize();
    key.map(Some)
}

fn install_key_file(path: &Path, key: &MasterKey) -> Result<()> {
    let staged = staging_path(path);

    let result = write_staged_key(&staged, key)
        .and_then(|()| std::fs::hard_link(&staged, path).map_err(VaultError::from));

    if let Err(cleanup) = std::fs::remove_file(&staged) {
        if cleanup.kind() != ErrorKind::NotFound {
            warn!("Could not remove staging key file {:?}: {}", staged, cleanup);
        }
    }

    result
}

fn write_staged_key(staged: &Path, key: &MasterKey) -> Result<()> {
    // a leftover from an earlier crash may carry looser permissions
    match std::fs::remove_file(staged) {
        Ok(()) => debug!("Removed stale staging key file {:?}", staged),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(staged)?;
    file.write_all(key.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
