//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Message Authentication Facility
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Configuration-related error
    ///
    /// Covers malformed persisted entries, unknown plugin names, and
    /// unsupported message types at module initialization. Fatal to the
    /// specific registration or module-init call, never to the registry.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed registration key string on decode
    ///
    /// Signals corrupted persisted state or programmer error.
    #[error("Invalid registration key: {message}")]
    InvalidKey {
        /// Description of the malformed key
        message: String,
    },

    /// Auth module could not be constructed
    ///
    /// Callers log this and treat the module as absent; the chain continues.
    #[error("Failed to load auth module '{module}': {message}")]
    ModuleLoad {
        /// Configured module name
        module: String,
        /// Description of the load failure
        message: String,
    },

    /// Failure raised by an auth module during invocation
    ///
    /// The chain executor propagates this verbatim to the caller.
    #[error("Auth module failure: {message}")]
    Module {
        /// Description of the module failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backing store read or write failure
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the persistence failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key<S: Into<String>>(message: S) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Create a module load error
    pub fn module_load<M: Into<String>, S: Into<String>>(module: M, message: S) -> Self {
        Self::ModuleLoad {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a module invocation error
    pub fn module<S: Into<String>>(message: S) -> Self {
        Self::Module {
            message: message.into(),
            source: None,
        }
    }

    /// Create a module invocation error with source
    pub fn module_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Module {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Create a persistence error with source
    pub fn persistence_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
