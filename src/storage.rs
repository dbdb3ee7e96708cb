//! Durable slot for the serialized favorites list.
//!
//! The store only ever reads the slot once at startup and overwrites it whole
//! after each mutation, so the port is a plain read/write pair over strings.
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const FAVORITES_SLOT: &str = "movieApp_favorites";

pub trait FavoritesStorage: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, contents: &str) -> Result<()>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for FileStorage {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("replacing {}", self.path.display()));
        }
        Ok(())
    }
}

/// In-memory slot. Clones share the same contents, so a test can keep a handle
/// and inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    contents: Option<String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.lock().contents = Some(contents.into());
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.lock().contents.clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Makes every subsequent write fail, like a full quota.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        // A poisoned slot still holds the last complete write.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FavoritesStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.lock().contents.clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        let mut slot = self.lock();
        if slot.fail_writes {
            anyhow::bail!("storage quota exceeded for slot '{}'", FAVORITES_SLOT);
        }
        slot.contents = Some(contents.to_string());
        slot.writes += 1;
        Ok(())
    }
}
