//! Crash-safe file writes and the id sequence sidecar.

use crate::core::{Result, StoreError};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ============================================================================
// Atomic writes
// ============================================================================

/// Replaces `path` with `bytes` so that readers only ever observe the old or
/// the new contents: write to a temp file in the same directory, sync, rename.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| StoreError::io("Failed to create directory", parent, e))?;

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| StoreError::io("Failed to create temp file in", parent, e))?;
    temp.write_all(bytes)
        .map_err(|e| StoreError::io("Failed to write temp file for", path, e))?;
    temp.flush()
        .map_err(|e| StoreError::io("Failed to flush temp file for", path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io("Failed to sync temp file for", path, e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io("Failed to rename temp file onto", path, e.error))?;
    Ok(())
}

/// Reads a whole file, mapping an absent file to `FileNotFound`.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::FileNotFound(path.to_path_buf()),
        _ => StoreError::io("Failed to read", path, e),
    })
}

// ============================================================================
// Id sequence sidecar
// ============================================================================

/// Persisted high-water mark for strictly monotonic id assignment.
///
/// Lives next to the table as `<table file>.seq` and holds the next id to
/// hand out as a single decimal line.
#[derive(Debug)]
pub struct IdSequence {
    path: PathBuf,
    next: u64,
}

impl IdSequence {
    pub fn sidecar_path(table_path: &Path) -> PathBuf {
        let mut name = OsString::from(table_path.as_os_str());
        name.push(".seq");
        PathBuf::from(name)
    }

    /// Opens the sidecar for `table_path`. The counter never starts below
    /// `floor`, so a missing or stale sidecar cannot reissue a live id.
    pub fn open(table_path: &Path, floor: u64) -> Result<Self> {
        let path = Self::sidecar_path(table_path);
        let stored = match read_file(&path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let next = text.trim().parse::<u64>().map_err(|e| {
                    StoreError::malformed(&path, format!("invalid id sequence: {}", e))
                })?;
                Some(next)
            }
            Err(StoreError::FileNotFound(_)) => None,
            Err(err) => return Err(err),
        };
        let next = stored.unwrap_or(1).max(floor).max(1);
        Ok(Self { path, next })
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Advances past `issued` and persists the new high-water mark.
    pub fn commit(&mut self, issued: u64) -> Result<()> {
        let after = issued
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(issued))?;
        let next = self.next.max(after);
        atomic_write(&self.path, format!("{}\n", next).as_bytes())?;
        self.next = next;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
