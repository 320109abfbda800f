//! Domain layer for the Message Authentication Facility
//!
//! Core types shared by every other crate in the workspace: the registration
//! key codec, persisted-entry model, auth statuses and control flags, the
//! per-call message exchange, and the port traits implemented by the core
//! registry and by concrete providers.
//!
//! This crate performs no I/O and holds no global state.

pub mod entry;
pub mod error;
pub mod exchange;
pub mod key;
pub mod ports;
pub mod status;

pub use entry::{BindingContext, PersistedEntry};
pub use error::{Error, Result};
pub use exchange::{
    MANDATORY_PROPERTY, MessageExchange, REGISTER_SESSION_PROPERTY, TOKEN_PROPERTY,
};
pub use key::RegistrationKey;
pub use ports::{
    AuthConfig, AuthContext, AuthModule, AuthProvider, BackingStore, ConfigRole, RegistryListener,
};
pub use status::{AuthStatus, ControlFlag, MessagePolicy, MessageType, Subject};
