//! Provider implementations for the Message Authentication Facility
//!
//! Concrete backing stores (file-based and in-memory) plus the baseline auth
//! modules, each registered into the `maf-core` plugin registries via linkme.

pub mod modules;
pub mod store;

pub use modules::{AllowModule, DenyModule, HeaderTokenModule};
pub use store::{FileBackingStore, InMemoryBackingStore};
