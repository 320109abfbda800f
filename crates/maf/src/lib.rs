//! # Message Authentication Facility
//!
//! A process-wide registry of pluggable message authentication providers,
//! with PAM-style module stacks executed per authentication context.
//!
//! Providers are bound to `(layer, app context)` scopes and looked up by
//! most-specific-match precedence. A provider hands out per-scope auth
//! configs, which in turn hand out cached auth contexts that run a chain of
//! auth modules under REQUIRED / REQUISITE / SUFFICIENT / OPTIONAL control
//! flags.
//!
//! ## Example
//!
//! ```ignore
//! use maf::core::registry::AuthRegistry;
//!
//! let registry = AuthRegistry::new();
//! let id = registry.register(None, Some("HttpServlet"), Some("petstore"), None);
//! assert!(registry.remove(&id));
//! ```
//!
//! ## Architecture
//!
//! - `domain` - keys, statuses, exchanges, and the port traits
//! - `core` - the registry, the chain executor, and the stack provider
//! - `providers` - backing stores and the built-in auth modules
//! - `config` / `logging` / `bootstrap` - wiring for the binary

/// Domain layer - keys, statuses, and port traits
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use maf_domain::*;
}

/// Core layer - registry, chain executor, and stack provider
///
/// Re-exports from the core crate for convenience
pub mod core {
    pub use maf_core::*;
}

/// Providers layer - backing stores and built-in modules
///
/// Re-exports from the providers crate for convenience
pub mod providers {
    pub use maf_providers::*;
}

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod logging;

// Re-export commonly used domain types at the crate root
pub use self::domain::*;

// Re-export the core entry points at the crate root
pub use self::core::registry::AuthRegistry;

pub use bootstrap::build_registry;
pub use config::{AppConfig, ConfigLoader};
pub use logging::init_logging;
