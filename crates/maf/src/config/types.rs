//! Configuration types

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use maf_core::provider::StackSpec;

use crate::constants::DEFAULT_LOG_LEVEL;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Declarative provider registrations applied at bootstrap
    #[serde(default)]
    pub providers: Vec<ProviderRegistration>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the persisted registration store; `None` runs without
    /// persistence
    pub store: Option<PathBuf>,
}

/// One provider registration applied at bootstrap
///
/// Either an inline `stack` spec (which takes precedence) or a `plugin` name
/// resolved through the provider plugin registry. Bootstrap registrations are
/// in-memory; durable registrations go through the backing store instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRegistration {
    /// Message layer the binding is scoped to
    pub layer: Option<String>,

    /// Application context the binding is scoped to
    pub app_context: Option<String>,

    /// Human-readable description of the binding
    pub description: Option<String>,

    /// Provider plugin name
    #[serde(default = "default_plugin")]
    pub plugin: String,

    /// Construction properties handed to the plugin factory
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Inline stack spec, bypassing the plugin factory
    #[serde(default)]
    pub stack: Option<StackSpec>,
}

fn default_plugin() -> String {
    "stack".to_string()
}
