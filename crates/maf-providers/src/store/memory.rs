//! In-memory persisted registration store
//!
//! Satisfies the backing store contract without touching disk. Useful for
//! tests and for hosts that want registry semantics with ephemeral state.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use maf_domain::entry::{BindingContext, PersistedEntry};
use maf_domain::error::Result;
use maf_domain::ports::BackingStore;

use super::{delete_entry, merge_entry};

/// Backing store holding entries in process memory
#[derive(Default)]
pub struct InMemoryBackingStore {
    entries: Mutex<Vec<PersistedEntry>>,
}

impl InMemoryBackingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with entries
    pub fn with_entries(entries: Vec<PersistedEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Snapshot of the current entries
    pub fn entries(&self) -> Vec<PersistedEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BackingStore for InMemoryBackingStore {
    fn load_all(&self) -> Result<Vec<PersistedEntry>> {
        Ok(self.entries())
    }

    fn store(
        &self,
        plugin: &str,
        properties: &BTreeMap<String, String>,
        context: Option<&BindingContext>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        merge_entry(&mut entries, plugin, properties, context);
        Ok(())
    }

    fn delete(&self, context: &BindingContext) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        delete_entry(&mut entries, context);
        Ok(())
    }
}
