//! Persisted registration entries
//!
//! The backing store holds a list of entries in two shapes: constructor-only
//! entries (plugin name plus properties, for default providers that
//! self-register when instantiated) and registration entries (plugin,
//! properties, and one or more binding contexts). Two entries are equivalent
//! for merge purposes when plugin name and properties match, regardless of
//! their contexts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::RegistrationKey;

/// One (layer, app context) scope a persisted provider is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingContext {
    /// Message layer, absent to match any layer
    pub layer: Option<String>,
    /// Application context, absent to match any app
    pub app_context: Option<String>,
    /// Human-readable description of the binding
    pub description: Option<String>,
}

impl BindingContext {
    /// Create a binding context
    pub fn new(layer: Option<&str>, app_context: Option<&str>, description: Option<&str>) -> Self {
        Self {
            layer: layer.map(str::to_owned),
            app_context: app_context.map(str::to_owned),
            description: description.map(str::to_owned),
        }
    }

    /// The registration key this context binds
    pub fn key(&self) -> RegistrationKey {
        RegistrationKey::new(self.layer.as_deref(), self.app_context.as_deref())
    }

    /// True when two contexts address the same (layer, app context) scope,
    /// ignoring the description
    pub fn same_scope(&self, other: &BindingContext) -> bool {
        self.layer == other.layer && self.app_context == other.app_context
    }
}

/// One entry of the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// Plugin name the provider is constructed from
    pub plugin: String,
    /// Construction properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Binding contexts; `None` marks a constructor-only entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BindingContext>>,
}

impl PersistedEntry {
    /// Create a constructor-only entry for a self-registering provider
    pub fn constructor_only(plugin: &str, properties: BTreeMap<String, String>) -> Self {
        Self {
            plugin: plugin.to_string(),
            properties,
            contexts: None,
        }
    }

    /// Create a registration entry bound to one context
    pub fn registration(
        plugin: &str,
        properties: BTreeMap<String, String>,
        context: BindingContext,
    ) -> Self {
        Self {
            plugin: plugin.to_string(),
            properties,
            contexts: Some(vec![context]),
        }
    }

    /// Whether this entry only describes how to construct the provider
    pub fn is_constructor_only(&self) -> bool {
        self.contexts.is_none()
    }

    /// Merge equivalence: plugin name and properties match, contexts ignored
    pub fn matches(&self, plugin: &str, properties: &BTreeMap<String, String>) -> bool {
        self.plugin == plugin && self.properties == *properties
    }

    /// Add a context, replacing any existing context for the same scope
    pub fn merge_context(&mut self, context: BindingContext) {
        let contexts = self.contexts.get_or_insert_with(Vec::new);
        contexts.retain(|c| !c.same_scope(&context));
        contexts.push(context);
    }

    /// Drop the context for the given scope; true if the entry still binds
    /// at least one context (or is constructor-only)
    pub fn remove_context(&mut self, scope: &BindingContext) -> bool {
        match &mut self.contexts {
            None => true,
            Some(contexts) => {
                contexts.retain(|c| !c.same_scope(scope));
                !contexts.is_empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_equivalence_ignores_contexts() {
        let a = PersistedEntry::registration(
            "stack",
            props(&[("config", "/etc/maf.toml")]),
            BindingContext::new(Some("L"), Some("A"), None),
        );
        assert!(a.matches("stack", &props(&[("config", "/etc/maf.toml")])));
        assert!(!a.matches("stack", &props(&[])));
        assert!(!a.matches("other", &props(&[("config", "/etc/maf.toml")])));
    }

    #[test]
    fn test_merge_context_replaces_same_scope() {
        let mut entry = PersistedEntry::registration(
            "stack",
            props(&[]),
            BindingContext::new(Some("L"), Some("A"), Some("old")),
        );
        entry.merge_context(BindingContext::new(Some("L"), Some("A"), Some("new")));
        entry.merge_context(BindingContext::new(Some("L"), None, None));

        let contexts = entry.contexts.as_ref().unwrap();
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].description.as_deref(), Some("new"));
    }

    #[test]
    fn test_remove_context_reports_empty_entries() {
        let scope = BindingContext::new(Some("L"), Some("A"), None);
        let mut entry = PersistedEntry::registration("stack", props(&[]), scope.clone());
        assert!(!entry.remove_context(&scope));

        let mut ctor = PersistedEntry::constructor_only("stack", props(&[]));
        assert!(ctor.remove_context(&scope));
    }
}
