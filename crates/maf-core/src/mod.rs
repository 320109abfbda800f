//! Core layer for the Message Authentication Facility
//!
//! Hosts the process-wide registration registry, the module-chain executor,
//! and the canonical stack-based provider with its epoch-invalidated context
//! cache. Concrete modules and backing stores plug in through the `plugin`
//! registries; the registry itself is an explicitly constructed service
//! instance with no global state.

pub mod chain;
pub mod plugin;
pub mod provider;
pub mod registry;

pub use chain::{ModuleChain, ModuleSpec, ModuleStep, SECURE_ACCEPTED, VALIDATE_ACCEPTED};
pub use plugin::{
    MODULE_PLUGINS, ModulePluginEntry, PROVIDER_PLUGINS, ProviderPluginEntry, list_modules,
    list_providers, resolve_module, resolve_provider,
};
pub use provider::{ContextSpec, StackAuthConfig, StackAuthProvider, StackSpec};
pub use registry::{AuthRegistry, Binding};
