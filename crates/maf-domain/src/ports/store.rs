//! Backing store port

use std::collections::BTreeMap;

use crate::entry::{BindingContext, PersistedEntry};
use crate::error::Result;

/// Durable list of persisted provider registrations
///
/// Loaded once at registry bootstrap and written on mutation. `store` and
/// `delete` are best effort: the registry logs a failure and keeps the
/// in-memory mutation, downgrading the registration to non-durable.
pub trait BackingStore: Send + Sync {
    /// Load every persisted entry
    ///
    /// Individual malformed entries are skipped (logged by the
    /// implementation); only an unreadable store is an error.
    fn load_all(&self) -> Result<Vec<PersistedEntry>>;

    /// Persist one registration
    ///
    /// With a context, merges into the entry whose plugin and properties
    /// match (claiming the context scope from any other entry); without one,
    /// records a constructor-only entry.
    fn store(
        &self,
        plugin: &str,
        properties: &BTreeMap<String, String>,
        context: Option<&BindingContext>,
    ) -> Result<()>;

    /// Delete the persisted registration for one context scope
    fn delete(&self, context: &BindingContext) -> Result<()>;
}
