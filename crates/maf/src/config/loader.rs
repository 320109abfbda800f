//! Configuration loader
//!
//! Loads configuration from default values, a TOML file, and `MAF_`-prefixed
//! environment variables, merged in that order.

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{info, warn};

use maf_domain::error::{Error, Result};

use crate::config::AppConfig;
use crate::constants::{CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILENAME};
use crate::logging::parse_log_level;

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables with prefix (e.g. `MAF_LOGGING_LEVEL`)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                info!("Configuration loaded from {}", config_path.display());
            } else {
                warn!("Configuration file not found: {}", config_path.display());
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            info!("Configuration loaded from {}", default_path.display());
        }

        // Underscore splits nested keys (MAF_LOGGING_LEVEL -> logging.level)
        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("_"));

        let app_config: AppConfig = figment
            .extract()
            .map_err(|e| Error::configuration_with_source("Failed to extract configuration", e))?;

        validate_app_config(&app_config)?;

        Ok(app_config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| Error::configuration_with_source("Failed to serialize config to TOML", e))?;
        std::fs::write(path.as_ref(), toml_string)?;
        Ok(())
    }

    /// Get the configured file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;
        let candidate = current_dir.join(DEFAULT_CONFIG_FILENAME);
        candidate.exists().then_some(candidate)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
fn validate_app_config(config: &AppConfig) -> Result<()> {
    parse_log_level(&config.logging.level)?;

    for registration in &config.providers {
        if registration.plugin.is_empty() && registration.stack.is_none() {
            return Err(Error::configuration(
                "Provider registration needs a plugin name or an inline stack",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_file() {
        let loader = ConfigLoader::new().with_config_path("/nonexistent/maf.toml");
        let config = loader.load().unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [[providers]]
            layer = "HttpServlet"
            app_context = "petstore"

            [[providers.stack.contexts]]
            id = "authenticate"

            [[providers.stack.contexts.modules]]
            module = "allow"
            flag = "required"
            "#
        )
        .unwrap();

        let loader = ConfigLoader::new().with_config_path(file.path());
        let config = loader.load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].layer.as_deref(), Some("HttpServlet"));
        assert!(config.providers[0].stack.is_some());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[logging]\nlevel = \"verbose\"").unwrap();

        let loader = ConfigLoader::new().with_config_path(file.path());
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maf.toml");

        let mut config = AppConfig::default();
        config.logging.level = "warn".to_string();
        config.registry.store = Some(dir.path().join("registrations.json"));

        let loader = ConfigLoader::new().with_config_path(&path);
        loader.save_to_file(&config, &path).unwrap();

        let reloaded = loader.load().unwrap();
        assert_eq!(reloaded.logging.level, "warn");
        assert_eq!(reloaded.registry.store, config.registry.store);
    }
}
