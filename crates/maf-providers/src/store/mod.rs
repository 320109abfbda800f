//! Backing store implementations

pub mod file;
pub mod memory;

pub use file::FileBackingStore;
pub use memory::InMemoryBackingStore;

use maf_domain::entry::{BindingContext, PersistedEntry};

/// Merge one registration into an entry list
///
/// With a context, the scope is first reclaimed from every other entry, then
/// appended to the entry whose plugin and properties match (created when
/// absent). Registration entries left without contexts are dropped;
/// constructor-only entries are never pruned.
pub(crate) fn merge_entry(
    entries: &mut Vec<PersistedEntry>,
    plugin: &str,
    properties: &std::collections::BTreeMap<String, String>,
    context: Option<&BindingContext>,
) {
    if let Some(context) = context {
        for entry in entries.iter_mut() {
            if !entry.matches(plugin, properties) {
                entry.remove_context(context);
            }
        }
        entries.retain(|e| !e.contexts.as_ref().is_some_and(Vec::is_empty));
    }

    if let Some(existing) = entries.iter_mut().find(|e| e.matches(plugin, properties)) {
        if let Some(context) = context {
            existing.merge_context(context.clone());
        }
        return;
    }

    entries.push(match context {
        Some(context) => PersistedEntry::registration(plugin, properties.clone(), context.clone()),
        None => PersistedEntry::constructor_only(plugin, properties.clone()),
    });
}

/// Remove one context scope from an entry list
pub(crate) fn delete_entry(entries: &mut Vec<PersistedEntry>, context: &BindingContext) {
    entries.retain_mut(|entry| entry.remove_context(context));
}
