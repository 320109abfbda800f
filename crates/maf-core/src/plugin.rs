//! Plugin registries for auth modules and providers
//!
//! Construct-by-configured-name without runtime reflection: implementations
//! register a static entry in a `linkme` distributed slice at compile time,
//! and configuration selects an entry by name at runtime.
//!
//! ## Registering a module (in maf-providers)
//!
//! ```ignore
//! use maf_core::plugin::{MODULE_PLUGINS, ModulePluginEntry};
//!
//! #[linkme::distributed_slice(MODULE_PLUGINS)]
//! static ALLOW_MODULE: ModulePluginEntry = ModulePluginEntry {
//!     name: "allow",
//!     description: "Unconditionally successful module",
//!     factory: |options| Ok(Box::new(AllowModule::from_options(options)?)),
//! };
//! ```
//!
//! ## Resolving
//!
//! ```ignore
//! let module = maf_core::plugin::resolve_module("allow", &options)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use maf_domain::ports::{AuthModule, AuthProvider};

use crate::registry::AuthRegistry;

/// Registry entry for auth modules
///
/// The factory receives the statically configured per-module options and
/// returns an uninitialized module; the chain builder performs
/// initialization.
pub struct ModulePluginEntry {
    /// Unique module name (e.g. "allow", "header-token")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create a module instance
    pub factory: fn(&BTreeMap<String, String>) -> Result<Box<dyn AuthModule>, String>,
}

/// Distributed slice collecting module plugins at link time
#[linkme::distributed_slice]
pub static MODULE_PLUGINS: [ModulePluginEntry] = [..];

/// Registry entry for auth providers
///
/// The factory receives the persisted properties and a registry handle;
/// self-registering default providers use the handle to bind themselves.
pub struct ProviderPluginEntry {
    /// Unique provider name (e.g. "stack")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create a provider instance
    pub factory:
        fn(&BTreeMap<String, String>, &AuthRegistry) -> Result<Arc<dyn AuthProvider>, String>,
}

/// Distributed slice collecting provider plugins at link time
#[linkme::distributed_slice]
pub static PROVIDER_PLUGINS: [ProviderPluginEntry] = [..];

/// Resolve an auth module by plugin name
pub fn resolve_module(
    name: &str,
    options: &BTreeMap<String, String>,
) -> Result<Box<dyn AuthModule>, String> {
    for entry in MODULE_PLUGINS {
        if entry.name == name {
            return (entry.factory)(options);
        }
    }
    let available: Vec<&str> = MODULE_PLUGINS.iter().map(|e| e.name).collect();
    Err(format!(
        "Unknown auth module '{name}'. Available modules: {available:?}"
    ))
}

/// Resolve an auth provider by plugin name
pub fn resolve_provider(
    name: &str,
    properties: &BTreeMap<String, String>,
    registry: &AuthRegistry,
) -> Result<Arc<dyn AuthProvider>, String> {
    for entry in PROVIDER_PLUGINS {
        if entry.name == name {
            return (entry.factory)(properties, registry);
        }
    }
    let available: Vec<&str> = PROVIDER_PLUGINS.iter().map(|e| e.name).collect();
    Err(format!(
        "Unknown auth provider '{name}'. Available providers: {available:?}"
    ))
}

/// List all registered module plugins as (name, description)
pub fn list_modules() -> Vec<(&'static str, &'static str)> {
    MODULE_PLUGINS
        .iter()
        .map(|e| (e.name, e.description))
        .collect()
}

/// List all registered provider plugins as (name, description)
pub fn list_providers() -> Vec<(&'static str, &'static str)> {
    PROVIDER_PLUGINS
        .iter()
        .map(|e| (e.name, e.description))
        .collect()
}
