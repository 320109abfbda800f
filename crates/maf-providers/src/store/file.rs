//! File-backed persisted registration store
//!
//! Keeps the persisted entry list in one JSON file. The on-disk shape is an
//! implementation detail; only the load/store/delete contract is stable.
//! Individual malformed entries are skipped on load so one corrupt record
//! cannot take the registry down with it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use maf_domain::entry::{BindingContext, PersistedEntry};
use maf_domain::error::{Error, Result};
use maf_domain::ports::BackingStore;

use super::{delete_entry, merge_entry};

/// Backing store persisting entries to a JSON file
pub struct FileBackingStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_guard: Mutex<()>,
}

impl FileBackingStore {
    /// Create a store over the given file path
    ///
    /// The file is created on first write; a missing file loads as empty.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_guard: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<PersistedEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| Error::persistence_with_source("backing store file is unreadable", e))?;
        let mut entries = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<PersistedEntry>(value.clone()) {
                Ok(entry) => entries.push(entry),
                Err(error) => warn!(%error, %value, "skipping malformed persisted entry"),
            }
        }
        Ok(entries)
    }

    fn save(&self, entries: &[PersistedEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)?;
        debug!(path = %self.path.display(), entries = entries.len(), "backing store written");
        Ok(())
    }
}

impl BackingStore for FileBackingStore {
    fn load_all(&self) -> Result<Vec<PersistedEntry>> {
        self.load()
    }

    fn store(
        &self,
        plugin: &str,
        properties: &BTreeMap<String, String>,
        context: Option<&BindingContext>,
    ) -> Result<()> {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.load()?;
        merge_entry(&mut entries, plugin, properties, context);
        self.save(&entries)
    }

    fn delete(&self, context: &BindingContext) -> Result<()> {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entries = self.load()?;
        delete_entry(&mut entries, context);
        self.save(&entries)
    }
}
