// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Storage backends holding the queue's single persisted slot.
//!
//! A backend stores one opaque string (the serialized record list). The
//! [`QueueStore`](crate::store::QueueStore) owns serialization; backends only
//! move bytes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Held for the duration of a read-modify-write cycle.
///
/// Releases any cross-process lock the backend took when dropped.
pub struct StorageGuard {
    _file: Option<File>,
}

impl StorageGuard {
    /// A guard that holds nothing, for backends without cross-process locking.
    pub fn none() -> Self {
        StorageGuard { _file: None }
    }
}

/// A single persisted slot.
pub trait QueueStorage: Send + Sync {
    /// Reads the slot. Returns `None` if it has never been written or was deleted.
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the slot contents.
    fn save(&self, contents: &str) -> Result<()>;

    /// Deletes the slot entirely.
    fn delete(&self) -> Result<()>;

    /// Takes the backend's exclusive lock for a read-modify-write cycle.
    fn lock(&self) -> Result<StorageGuard> {
        Ok(StorageGuard::none())
    }
}

/// Slot stored as one JSON file on disk.
///
/// Writes go to a sibling temp file which is fsynced and renamed over the
/// slot, so a crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Opens storage at the given path, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(FileStorage { path })
    }

    /// Returns the path of the slot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

impl QueueStorage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        let tmp_path = self.sibling(".tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> Result<StorageGuard> {
        let lock_path = self.sibling(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive().map_err(|source| Error::Lock {
            path: lock_path.display().to_string(),
            source,
        })?;
        Ok(StorageGuard { _file: Some(file) })
    }
}

/// In-process slot, lost when dropped.
///
/// Failure injection switches let tests exercise the persistence-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage whose slot already holds `contents`.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        MemoryStorage { slot: Mutex::new(Some(contents.into())), ..Self::default() }
    }

    /// Makes every subsequent `load` fail with an I/O error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `save` and `delete` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the raw slot contents.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn injected(kind: &str) -> Error {
        Error::Io(std::io::Error::other(format!("injected {kind} failure")))
    }
}

impl QueueStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected("read"));
        }
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected("write"));
        }
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected("write"));
        }
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

impl<S: QueueStorage + ?Sized> QueueStorage for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, contents: &str) -> Result<()> {
        (**self).save(contents)
    }

    fn delete(&self) -> Result<()> {
        (**self).delete()
    }

    fn lock(&self) -> Result<StorageGuard> {
        (**self).lock()
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
