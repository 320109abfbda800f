//! Process-wide registration registry
//!
//! Resolves provider bindings by specificity, supports listener
//! subscriptions, and mirrors persistent registrations into the backing
//! store. The registry is an explicitly constructed service instance: build
//! one, share it behind an `Arc`, drop it to tear it down.
//!
//! One reader-writer lock guards all registry maps. Reads never block each
//! other, every mutation is exclusive, and listener notification always
//! happens after the lock has been released so listeners may re-enter the
//! registry from their callback.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use maf_domain::entry::{BindingContext, PersistedEntry};
use maf_domain::error::Result;
use maf_domain::key::RegistrationKey;
use maf_domain::ports::{AuthProvider, BackingStore, RegistryListener};

use crate::plugin;

/// One active registration tying a key to a provider
#[derive(Clone)]
pub struct Binding {
    /// Stable registration id (the encoded key)
    pub id: String,
    /// The key this binding is registered at
    pub key: RegistrationKey,
    /// Bound provider; `None` explicitly masks more general bindings
    pub provider: Option<Arc<dyn AuthProvider>>,
    /// Human-readable description
    pub description: Option<String>,
    /// Whether the binding is mirrored into the backing store
    pub persistent: bool,
    /// Plugin identity the persisted entry was written with
    source: Option<PersistSource>,
}

/// Plugin name and properties a persistent binding was constructed from
#[derive(Clone)]
struct PersistSource {
    plugin: String,
    properties: std::collections::BTreeMap<String, String>,
}

/// Identity of a provider instance, for the reverse index
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct ProviderId(usize);

fn provider_id(provider: &Arc<dyn AuthProvider>) -> ProviderId {
    ProviderId(Arc::as_ptr(provider).cast::<()>() as usize)
}

#[derive(Default)]
struct RegistryState {
    /// Primary map: registration id to binding
    bindings: HashMap<String, Binding>,
    /// Reverse map: provider identity to the ids bound to it
    provider_index: HashMap<ProviderId, HashSet<String>>,
    /// Listener subscriptions keyed by the reference registration id
    listeners: HashMap<String, Vec<Arc<dyn RegistryListener>>>,
}

impl RegistryState {
    fn index_provider(&mut self, provider: Option<&Arc<dyn AuthProvider>>, id: &str) {
        if let Some(provider) = provider {
            self.provider_index
                .entry(provider_id(provider))
                .or_default()
                .insert(id.to_string());
        }
    }

    fn unindex_provider(&mut self, provider: Option<&Arc<dyn AuthProvider>>, id: &str) {
        if let Some(provider) = provider {
            let key = provider_id(provider);
            if let Some(ids) = self.provider_index.get_mut(&key) {
                ids.remove(id);
                if ids.is_empty() {
                    self.provider_index.remove(&key);
                }
            }
        }
    }

    /// Listeners whose subscription key implies the changed key, deduplicated
    fn affected_listeners(&self, changed: &RegistrationKey) -> Vec<Arc<dyn RegistryListener>> {
        let mut affected: Vec<Arc<dyn RegistryListener>> = Vec::new();
        for (id, listeners) in &self.listeners {
            let Ok(subscribed) = RegistrationKey::decode(id) else {
                continue;
            };
            if !subscribed.implies(changed) {
                continue;
            }
            for listener in listeners {
                if !affected.iter().any(|a| Arc::ptr_eq(a, listener)) {
                    affected.push(listener.clone());
                }
            }
        }
        affected
    }
}

/// The registration registry
pub struct AuthRegistry {
    state: RwLock<RegistryState>,
    store: Option<Arc<dyn BackingStore>>,
}

impl AuthRegistry {
    /// Create an empty registry with no backing store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            store: None,
        }
    }

    /// Create a registry backed by a store and load its persisted state
    pub fn with_store(store: Arc<dyn BackingStore>) -> Result<Self> {
        let registry = Self {
            state: RwLock::new(RegistryState::default()),
            store: Some(store),
        };
        registry.refresh()?;
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the provider for a (layer, app context) pair
    ///
    /// Keys are probed in strict precedence order: exact, app-only,
    /// layer-only, neither. The first binding found decides the result, even
    /// when it binds no provider. A supplied listener is subscribed under the
    /// exact key whether or not a provider was found.
    pub fn lookup(
        &self,
        layer: Option<&str>,
        app_context: Option<&str>,
        listener: Option<Arc<dyn RegistryListener>>,
    ) -> Option<Arc<dyn AuthProvider>> {
        match listener {
            Some(listener) => {
                let mut state = self.write();
                let id = RegistrationKey::new(layer, app_context).encode();
                let subscribers = state.listeners.entry(id).or_default();
                if !subscribers.iter().any(|s| Arc::ptr_eq(s, &listener)) {
                    subscribers.push(listener);
                }
                Self::probe(&state, layer, app_context)
            }
            None => Self::probe(&self.read(), layer, app_context),
        }
    }

    fn probe(
        state: &RegistryState,
        layer: Option<&str>,
        app_context: Option<&str>,
    ) -> Option<Arc<dyn AuthProvider>> {
        for key in RegistrationKey::precedence(layer, app_context) {
            if let Some(binding) = state.bindings.get(&key.encode()) {
                return binding.provider.clone();
            }
        }
        None
    }

    /// Register an in-memory (non-persistent) provider binding
    ///
    /// Registering at an occupied key keeps the existing id and replaces the
    /// provider, description, and persistence of the binding; a previously
    /// persistent binding has its stale persisted entry deleted. Returns the
    /// registration id.
    pub fn register(
        &self,
        provider: Option<Arc<dyn AuthProvider>>,
        layer: Option<&str>,
        app_context: Option<&str>,
        description: Option<&str>,
    ) -> String {
        let key = RegistrationKey::new(layer, app_context);
        self.apply_registration(provider, key, description, false, None)
    }

    /// Register a persistent provider binding constructed from a plugin
    ///
    /// The provider is constructed by name through the plugin registry, the
    /// entry is written to the backing store before the in-memory maps
    /// change, and only then is the binding applied. A store write failure is
    /// logged and downgrades the registration to non-persistent rather than
    /// rejecting it.
    pub fn register_plugin(
        &self,
        plugin: &str,
        properties: std::collections::BTreeMap<String, String>,
        layer: Option<&str>,
        app_context: Option<&str>,
        description: Option<&str>,
    ) -> Result<String> {
        let provider = plugin::resolve_provider(plugin, &properties, self)
            .map_err(maf_domain::error::Error::configuration)?;

        let key = RegistrationKey::new(layer, app_context);
        let context = BindingContext::new(layer, app_context, description);
        let mut persistent = false;
        if let Some(store) = &self.store {
            match store.store(plugin, &properties, Some(&context)) {
                Ok(()) => persistent = true,
                Err(error) => warn!(
                    plugin,
                    key = %key,
                    %error,
                    "backing store write failed, registration downgraded to non-persistent"
                ),
            }
        }

        let source = persistent.then(|| PersistSource {
            plugin: plugin.to_string(),
            properties,
        });
        Ok(self.apply_registration(Some(provider), key, description, persistent, source))
    }

    fn apply_registration(
        &self,
        provider: Option<Arc<dyn AuthProvider>>,
        key: RegistrationKey,
        description: Option<&str>,
        persistent: bool,
        source: Option<PersistSource>,
    ) -> String {
        let id = key.encode();
        let binding = Binding {
            id: id.clone(),
            key: key.clone(),
            provider,
            description: description.map(str::to_owned),
            persistent,
            source,
        };

        let (stale_persisted, listeners) = {
            let mut state = self.write();
            let previous = state.bindings.insert(id.clone(), binding.clone());
            if let Some(previous) = &previous {
                state.unindex_provider(previous.provider.as_ref(), &id);
            }
            state.index_provider(binding.provider.as_ref(), &id);

            // A non-persistent replacement leaves a stale persisted entry
            // behind; queue its deletion for after the lock is dropped.
            let stale = previous
                .filter(|p| p.persistent && !persistent)
                .and_then(|p| p.source);
            (stale, state.affected_listeners(&key))
        };

        if let (Some(_stale), Some(store)) = (stale_persisted, &self.store) {
            let context = BindingContext::new(key.layer(), key.app_context(), None);
            if let Err(error) = store.delete(&context) {
                warn!(key = %key, %error, "failed to delete stale persisted entry");
            }
        }

        debug!(id, key = %key, persistent, "registration applied");
        Self::deliver(&listeners, &key);
        id
    }

    /// Remove a binding by registration id
    ///
    /// Returns `false` when no such binding exists. A persistent binding's
    /// stored entry is deleted best-effort after the in-memory removal.
    pub fn remove(&self, id: &str) -> bool {
        let Ok(key) = RegistrationKey::decode(id) else {
            debug!(id, "remove called with malformed registration id");
            return false;
        };

        let (removed, listeners) = {
            let mut state = self.write();
            let Some(binding) = state.bindings.remove(id) else {
                return false;
            };
            state.unindex_provider(binding.provider.as_ref(), id);
            (binding, state.affected_listeners(&key))
        };

        if removed.persistent {
            if let Some(store) = &self.store {
                let context = BindingContext::new(key.layer(), key.app_context(), None);
                if let Err(error) = store.delete(&context) {
                    warn!(id, %error, "failed to delete persisted entry for removed binding");
                }
            }
        }

        info!(id, key = %key, "registration removed");
        Self::deliver(&listeners, &key);
        true
    }

    /// Detach a listener from every subscription implied by a reference key
    ///
    /// Returns the registration ids the listener was removed from.
    pub fn detach_listener(
        &self,
        listener: &Arc<dyn RegistryListener>,
        layer: Option<&str>,
        app_context: Option<&str>,
    ) -> Vec<String> {
        let reference = RegistrationKey::new(layer, app_context);
        let mut state = self.write();
        let mut detached = Vec::new();
        state.listeners.retain(|id, listeners| {
            let implied = RegistrationKey::decode(id)
                .is_ok_and(|subscribed| reference.implies(&subscribed));
            if implied {
                let before = listeners.len();
                listeners.retain(|l| !Arc::ptr_eq(l, listener));
                if listeners.len() != before {
                    detached.push(id.clone());
                }
            }
            !listeners.is_empty()
        });
        detached
    }

    /// Wholesale reload from the backing store
    ///
    /// Replaces every in-memory map with the persisted state. Providers for
    /// registration entries are constructed before the write lock is taken;
    /// constructor-only entries are instantiated after the swap, since their
    /// factories may re-enter the registry to self-register. The pre-reload
    /// listener map is notified once the lock has been released.
    pub fn refresh(&self) -> Result<()> {
        let Some(store) = &self.store else {
            debug!("refresh on a storeless registry is a no-op");
            return Ok(());
        };
        let entries = store.load_all()?;

        let mut next = RegistryState::default();
        let mut constructor_only = Vec::new();
        for entry in entries {
            if entry.is_constructor_only() {
                constructor_only.push(entry);
                continue;
            }
            let provider = match plugin::resolve_provider(&entry.plugin, &entry.properties, self) {
                Ok(provider) => provider,
                Err(message) => {
                    warn!(
                        plugin = entry.plugin.as_str(),
                        %message,
                        "skipping persisted registration with unusable provider"
                    );
                    continue;
                }
            };
            let source = PersistSource {
                plugin: entry.plugin.clone(),
                properties: entry.properties.clone(),
            };
            for context in entry.contexts.iter().flatten() {
                let key = context.key();
                let id = key.encode();
                let binding = Binding {
                    id: id.clone(),
                    key,
                    provider: Some(provider.clone()),
                    description: context.description.clone(),
                    persistent: true,
                    source: Some(source.clone()),
                };
                next.index_provider(binding.provider.as_ref(), &id);
                next.bindings.insert(id, binding);
            }
        }

        let (previous_listeners, loaded) = {
            let mut state = self.write();
            let previous = std::mem::replace(&mut *state, next);
            (previous.listeners, state.bindings.len())
        };
        info!(bindings = loaded, "registry reloaded from backing store");

        // Self-registering default providers run against the live registry.
        for entry in constructor_only {
            if let Err(message) = plugin::resolve_provider(&entry.plugin, &entry.properties, self) {
                warn!(
                    plugin = entry.plugin.as_str(),
                    %message,
                    "failed to construct self-registering provider"
                );
            }
        }

        for (id, listeners) in previous_listeners {
            if let Ok(key) = RegistrationKey::decode(&id) {
                Self::deliver(&listeners, &key);
            }
        }
        Ok(())
    }

    /// Registration ids currently bound to a provider instance
    pub fn registration_ids(&self, provider: &Arc<dyn AuthProvider>) -> Vec<String> {
        let state = self.read();
        state
            .provider_index
            .get(&provider_id(provider))
            .map(|ids| {
                let mut ids: Vec<String> = ids.iter().cloned().collect();
                ids.sort();
                ids
            })
            .unwrap_or_default()
    }

    /// All registration ids currently bound
    pub fn binding_ids(&self) -> Vec<String> {
        self.read().bindings.keys().cloned().collect()
    }

    /// Snapshot of the binding registered at a key, if any
    pub fn binding(&self, layer: Option<&str>, app_context: Option<&str>) -> Option<Binding> {
        let id = RegistrationKey::new(layer, app_context).encode();
        self.read().bindings.get(&id).cloned()
    }

    /// Deliver a change notification, isolating each listener's failure
    fn deliver(listeners: &[Arc<dyn RegistryListener>], key: &RegistrationKey) {
        for listener in listeners {
            if let Err(error) = listener.notify(key.layer(), key.app_context()) {
                warn!(key = %key, %error, "registry listener failed");
            }
        }
    }
}

impl Default for AuthRegistry {
    fn default() -> Self {
        Self::new()
    }
}
