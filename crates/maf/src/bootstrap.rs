//! Registry bootstrap
//!
//! Builds the process-wide registry from configuration: attaches the file
//! backing store when one is configured (replaying any persisted
//! registrations) and applies the declarative provider registrations.

use std::sync::Arc;

use tracing::{info, warn};

use maf_core::plugin;
use maf_core::provider::StackAuthProvider;
use maf_core::registry::AuthRegistry;
use maf_domain::error::Result;
use maf_domain::ports::AuthProvider;
use maf_providers::store::FileBackingStore;

use crate::config::AppConfig;

/// Build an [`AuthRegistry`] from application configuration
///
/// Persisted registrations load first, then configured registrations apply
/// on top, so a configured binding wins over a persisted one at the same
/// scope. Registrations from configuration are in-memory only; a failing
/// one is logged and skipped so the rest of the configuration still applies.
pub fn build_registry(config: &AppConfig) -> Result<Arc<AuthRegistry>> {
    let registry = match &config.registry.store {
        Some(path) => {
            info!(store = %path.display(), "registry persistence enabled");
            let store = Arc::new(FileBackingStore::new(path));
            Arc::new(AuthRegistry::with_store(store)?)
        }
        None => Arc::new(AuthRegistry::new()),
    };

    for registration in &config.providers {
        let layer = registration.layer.as_deref();
        let app_context = registration.app_context.as_deref();
        let description = registration.description.as_deref();

        let provider: Arc<dyn AuthProvider> = match &registration.stack {
            Some(spec) => Arc::new(StackAuthProvider::new(spec.clone())),
            None => {
                match plugin::resolve_provider(
                    &registration.plugin,
                    &registration.properties,
                    &registry,
                ) {
                    Ok(provider) => provider,
                    Err(error) => {
                        warn!(
                            plugin = %registration.plugin,
                            %error,
                            "skipping provider registration, construction failed"
                        );
                        continue;
                    }
                }
            }
        };

        let id = registry.register(Some(provider), layer, app_context, description);
        info!(id, "registered configured provider");
    }

    Ok(registry)
}
