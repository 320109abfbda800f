//! Stack-based auth provider
//!
//! The canonical provider implementation: a declarative spec maps context ids
//! to ordered module stacks, the provider owns the epoch counter, and each
//! auth config caches built contexts per (context id, properties identity).
//! Contexts are keyed by structural equality of the properties map, never by
//! a bare hash, so two distinct maps cannot alias.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use maf_domain::error::Result;
use maf_domain::exchange::MANDATORY_PROPERTY;
use maf_domain::ports::{AuthConfig, AuthContext, AuthProvider, ConfigRole};
use maf_domain::status::MessagePolicy;

use crate::chain::{ModuleChain, ModuleSpec};
use crate::plugin::{PROVIDER_PLUGINS, ProviderPluginEntry};
use crate::registry::AuthRegistry;

/// Module stack configured for one context id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSpec {
    /// Context id the stack applies to
    pub id: String,
    /// Ordered module stack
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// Declarative configuration of a stack provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackSpec {
    /// Provider-wide properties layered under every module's options
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Per-context module stacks
    #[serde(default)]
    pub contexts: Vec<ContextSpec>,
}

impl StackSpec {
    /// Look up the module stack for a context id
    fn stack(&self, context_id: &str) -> Option<&ContextSpec> {
        self.contexts.iter().find(|c| c.id == context_id)
    }
}

/// Identity of a properties map in the context cache
///
/// Absent properties collapse to a fixed sentinel; present maps are compared
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PropertiesKey {
    Absent,
    Present(BTreeMap<String, String>),
}

impl PropertiesKey {
    fn from(properties: Option<&BTreeMap<String, String>>) -> Self {
        match properties {
            None => Self::Absent,
            Some(map) => Self::Present(map.clone()),
        }
    }
}

type ConfigKey = (ConfigRole, Option<String>, Option<String>);

/// Provider producing stack-backed auth configs
pub struct StackAuthProvider {
    spec: Arc<StackSpec>,
    epoch: Arc<AtomicU64>,
    configs: RwLock<HashMap<ConfigKey, Arc<StackAuthConfig>>>,
}

impl StackAuthProvider {
    /// Create a provider from its spec
    pub fn new(spec: StackSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            epoch: Arc::new(AtomicU64::new(0)),
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of contexts the spec protects
    pub fn protected_contexts(&self) -> usize {
        self.spec.contexts.len()
    }
}

impl AuthProvider for StackAuthProvider {
    fn auth_config(
        &self,
        role: ConfigRole,
        layer: Option<&str>,
        app_context: Option<&str>,
    ) -> Result<Arc<dyn AuthConfig>> {
        let key: ConfigKey = (role, layer.map(str::to_owned), app_context.map(str::to_owned));
        {
            let configs = self
                .configs
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = configs.get(&key) {
                return Ok(config.clone());
            }
        }
        let mut configs = self
            .configs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let config = configs
            .entry(key)
            .or_insert_with(|| {
                Arc::new(StackAuthConfig {
                    role,
                    layer: layer.map(str::to_owned),
                    app_context: app_context.map(str::to_owned),
                    spec: self.spec.clone(),
                    epoch: self.epoch.clone(),
                    cache: RwLock::new(ContextCache {
                        epoch_snapshot: self.epoch.load(Ordering::Acquire),
                        contexts: HashMap::new(),
                    }),
                })
            })
            .clone();
        Ok(config)
    }

    fn refresh(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(epoch, "stack provider refreshed");
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

/// Cached auth contexts for one provider/role/scope triple
struct ContextCache {
    epoch_snapshot: u64,
    contexts: HashMap<(String, PropertiesKey), Arc<ModuleChain>>,
}

/// Auth config backed by a [`StackSpec`]
pub struct StackAuthConfig {
    role: ConfigRole,
    layer: Option<String>,
    app_context: Option<String>,
    spec: Arc<StackSpec>,
    epoch: Arc<AtomicU64>,
    cache: RwLock<ContextCache>,
}

impl StackAuthConfig {
    /// Build the chain for one cache miss
    fn build_chain(
        &self,
        context_id: &str,
        properties: Option<&BTreeMap<String, String>>,
        stack: &ContextSpec,
    ) -> Result<ModuleChain> {
        let mut call_properties = self.spec.properties.clone();
        if let Some(map) = properties {
            call_properties.extend(map.clone());
        }
        let mandatory = properties
            .and_then(|p| p.get(MANDATORY_PROPERTY))
            .is_some_and(|v| v == "true");
        ModuleChain::build(
            context_id,
            &stack.modules,
            Some(&call_properties),
            Some(&MessagePolicy::request(mandatory)),
            Some(&MessagePolicy::response(mandatory)),
        )
    }
}

impl AuthConfig for StackAuthConfig {
    fn role(&self) -> ConfigRole {
        self.role
    }

    fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    fn app_context(&self) -> Option<&str> {
        self.app_context.as_deref()
    }

    fn context(
        &self,
        context_id: &str,
        properties: Option<&BTreeMap<String, String>>,
    ) -> Result<Option<Arc<dyn AuthContext>>> {
        // An empty resolved stack means no context exists at all: the
        // scope is unprotected for this context id.
        let Some(stack) = self.spec.stack(context_id) else {
            return Ok(None);
        };
        if stack.modules.is_empty() {
            return Ok(None);
        }

        let current_epoch = self.epoch.load(Ordering::Acquire);
        let key = (context_id.to_string(), PropertiesKey::from(properties));

        // Read-checked: serve a hit only while the epoch snapshot is fresh.
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if cache.epoch_snapshot == current_epoch {
                if let Some(chain) = cache.contexts.get(&key) {
                    return Ok(Some(chain.clone()));
                }
            }
        }

        // Write-applied: clear on a stale epoch, then double-check before
        // constructing so a race builds exactly one context.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.epoch_snapshot != current_epoch {
            debug!(
                stale = cache.epoch_snapshot,
                current = current_epoch,
                "provider epoch advanced, clearing context cache"
            );
            cache.contexts.clear();
            cache.epoch_snapshot = current_epoch;
        }
        if let Some(chain) = cache.contexts.get(&key) {
            return Ok(Some(chain.clone()));
        }

        let chain = Arc::new(self.build_chain(context_id, properties, stack)?);
        cache.contexts.insert(key, chain.clone());
        Ok(Some(chain))
    }
}

/// Factory for the "stack" provider plugin
///
/// The optional `config` property names a TOML file holding the
/// [`StackSpec`]; without it the provider starts with an empty spec.
fn stack_factory(
    properties: &BTreeMap<String, String>,
    _registry: &AuthRegistry,
) -> std::result::Result<Arc<dyn AuthProvider>, String> {
    let spec = match properties.get("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read stack config '{path}': {e}"))?;
            toml::from_str(&text)
                .map_err(|e| format!("failed to parse stack config '{path}': {e}"))?
        }
        None => StackSpec::default(),
    };
    Ok(Arc::new(StackAuthProvider::new(spec)))
}

#[linkme::distributed_slice(PROVIDER_PLUGINS)]
static STACK_PROVIDER: ProviderPluginEntry = ProviderPluginEntry {
    name: "stack",
    description: "Declarative per-context module stacks with PAM-style control flags",
    factory: stack_factory,
};
