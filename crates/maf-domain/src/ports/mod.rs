//! Port traits
//!
//! Seams between the core facility and its collaborators: auth modules,
//! providers, the backing store, and registry listeners. Concrete
//! implementations live in `maf-core` and `maf-providers`.

pub mod listener;
pub mod module;
pub mod provider;
pub mod store;

pub use listener::RegistryListener;
pub use module::AuthModule;
pub use provider::{AuthConfig, AuthContext, AuthProvider, ConfigRole};
pub use store::BackingStore;
