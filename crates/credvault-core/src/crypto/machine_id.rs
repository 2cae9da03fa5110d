//! Best-effort per-host identifier
//!
//! Informational only. The value is neither secret nor stable across
//! reinstalls and must never be used as key material.

use rand::{rngs::OsRng, RngCore};
use tracing::debug;

/// Files holding the systemd / dbus machine id, in lookup order
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const LINUX_MACHINE_ID_FILES: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Maximum characters kept from a machine id file
const MACHINE_ID_LEN: usize = 32;

/// Get an identifier for the current machine.
///
/// Never empty: every platform source rejects blank values and the random
/// fallback is always 32 hex characters.
pub fn machine_id() -> String {
    platform_machine_id().unwrap_or_else(random_machine_id)
}

#[cfg(target_os = "linux")]
fn platform_machine_id() -> Option<String> {
    LINUX_MACHINE_ID_FILES
        .iter()
        .find_map(|path| read_machine_id_file(path))
        .or_else(|| hostname_id("linux"))
}

#[cfg(target_os = "macos")]
fn platform_machine_id() -> Option<String> {
    hostname_id("macos")
}

#[cfg(target_os = "windows")]
fn platform_machine_id() -> Option<String> {
    hostname_id("windows")
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn platform_machine_id() -> Option<String> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn read_machine_id_file(path: &str) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let id: String = contents.trim().chars().take(MACHINE_ID_LEN).collect();

    if id.is_empty() {
        None
    } else {
        debug!("Machine id read from {}", path);
        Some(id)
    }
}

#[cfg_attr(
    not(any(target_os = "linux", target_os = "macos", target_os = "windows")),
    allow(dead_code)
)]
fn hostname_id(os: &str) -> Option<String> {
    let name = hostname::get().ok()?;
    let name = name.to_string_lossy();
    let name = name.trim();

    if name.is_empty() {
        return None;
    }

    // whitespace would make the id awkward to log or paste
    let name: String = name.split_whitespace().collect::<Vec<_>>().join("-");
    Some(format!("{}-{}", os, name))
}

fn random_machine_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    debug!("Falling back to a random machine id");
    hex::encode(bytes)
}
