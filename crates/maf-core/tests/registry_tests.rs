//! Registry registration, lookup precedence, and listener delivery

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use maf_core::plugin::{PROVIDER_PLUGINS, ProviderPluginEntry};
use maf_core::provider::{StackAuthProvider, StackSpec};
use maf_core::registry::AuthRegistry;
use maf_domain::entry::{BindingContext, PersistedEntry};
use maf_domain::error::{Error, Result};
use maf_domain::ports::{AuthProvider, BackingStore, RegistryListener};

fn provider() -> Arc<dyn AuthProvider> {
    Arc::new(StackAuthProvider::new(StackSpec::default()))
}

/// Listener recording every notification it receives
#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<(Option<String>, Option<String>)>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<(Option<String>, Option<String>)> {
        self.events.lock().unwrap().clone()
    }
}

impl RegistryListener for RecordingListener {
    fn notify(&self, layer: Option<&str>, app_context: Option<&str>) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((layer.map(str::to_owned), app_context.map(str::to_owned)));
        Ok(())
    }
}

/// Listener whose notify always fails
struct FailingListener;

impl RegistryListener for FailingListener {
    fn notify(&self, _layer: Option<&str>, _app_context: Option<&str>) -> Result<()> {
        Err(Error::module("listener backend unavailable"))
    }
}

/// Read-only store seeded with fixed entries
struct SeededStore {
    entries: Vec<PersistedEntry>,
}

impl BackingStore for SeededStore {
    fn load_all(&self) -> Result<Vec<PersistedEntry>> {
        Ok(self.entries.clone())
    }

    fn store(
        &self,
        _plugin: &str,
        _properties: &BTreeMap<String, String>,
        _context: Option<&BindingContext>,
    ) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _context: &BindingContext) -> Result<()> {
        Ok(())
    }
}

#[linkme::distributed_slice(PROVIDER_PLUGINS)]
static SELF_BINDING_PROVIDER: ProviderPluginEntry = ProviderPluginEntry {
    name: "self-binding",
    description: "Test provider registering its own default binding",
    factory: |_properties, registry| {
        let provider: Arc<dyn AuthProvider> =
            Arc::new(StackAuthProvider::new(StackSpec::default()));
        registry.register(
            Some(provider.clone()),
            Some("SelfLayer"),
            None,
            Some("self-bound"),
        );
        Ok(provider)
    },
};

#[test]
fn test_register_and_lookup_exact() {
    let registry = AuthRegistry::new();
    let bound = provider();
    registry.register(Some(bound.clone()), Some("HttpServlet"), Some("app"), None);

    let found = registry
        .lookup(Some("HttpServlet"), Some("app"), None)
        .unwrap();
    assert!(Arc::ptr_eq(&found, &bound));
}

#[test]
fn test_lookup_precedence_most_specific_wins() {
    let registry = AuthRegistry::new();
    let exact = provider();
    let app_only = provider();
    let layer_only = provider();
    let default = provider();

    registry.register(Some(default.clone()), None, None, None);
    registry.register(Some(layer_only.clone()), Some("L"), None, None);
    registry.register(Some(app_only.clone()), None, Some("A"), None);
    let exact_id = registry.register(Some(exact.clone()), Some("L"), Some("A"), None);

    let found = registry.lookup(Some("L"), Some("A"), None).unwrap();
    assert!(Arc::ptr_eq(&found, &exact));

    // removing the exact binding falls through to app-only, then layer-only,
    // then the default
    assert!(registry.remove(&exact_id));
    let found = registry.lookup(Some("L"), Some("A"), None).unwrap();
    assert!(Arc::ptr_eq(&found, &app_only));

    let found = registry.lookup(Some("L"), Some("B"), None).unwrap();
    assert!(Arc::ptr_eq(&found, &layer_only));

    let found = registry.lookup(Some("M"), Some("B"), None).unwrap();
    assert!(Arc::ptr_eq(&found, &default));
}

#[test]
fn test_null_provider_binding_masks_general_bindings() {
    let registry = AuthRegistry::new();
    registry.register(Some(provider()), None, None, None);
    registry.register(None, Some("L"), Some("A"), Some("explicitly unprotected"));

    // the exact binding decides the lookup even though it binds no provider
    assert!(registry.lookup(Some("L"), Some("A"), None).is_none());
    assert!(registry.lookup(Some("L"), Some("B"), None).is_some());
}

#[test]
fn test_replacement_keeps_registration_id() {
    let registry = AuthRegistry::new();
    let first = registry.register(Some(provider()), Some("L"), Some("A"), Some("first"));
    let second = registry.register(Some(provider()), Some("L"), Some("A"), Some("second"));
    assert_eq!(first, second);

    let binding = registry.binding(Some("L"), Some("A")).unwrap();
    assert_eq!(binding.description.as_deref(), Some("second"));
}

#[test]
fn test_remove_unknown_or_malformed_id() {
    let registry = AuthRegistry::new();
    assert!(!registry.remove("0"));
    assert!(!registry.remove("9garbage"));
}

#[test]
fn test_listener_fires_for_changes_within_scope() {
    let registry = AuthRegistry::new();
    let listener = Arc::new(RecordingListener::default());

    // subscribe at the wildcard scope: it implies every key
    registry.lookup(None, None, Some(listener.clone() as Arc<dyn RegistryListener>));
    assert!(listener.events().is_empty());

    registry.register(Some(provider()), Some("L"), Some("A"), None);
    assert_eq!(
        listener.events(),
        vec![(Some("L".to_string()), Some("A".to_string()))]
    );

    let id = registry.register(Some(provider()), None, Some("A"), None);
    registry.remove(&id);
    assert_eq!(listener.events().len(), 3);
}

#[test]
fn test_listener_does_not_fire_outside_scope() {
    let registry = AuthRegistry::new();
    let listener = Arc::new(RecordingListener::default());

    // subscribed at an exact key, so only that exact key notifies
    registry.lookup(
        Some("L"),
        Some("A"),
        Some(listener.clone() as Arc<dyn RegistryListener>),
    );

    registry.register(Some(provider()), Some("L"), Some("B"), None);
    registry.register(Some(provider()), None, None, None);
    assert!(listener.events().is_empty());

    registry.register(Some(provider()), Some("L"), Some("A"), None);
    assert_eq!(listener.events().len(), 1);
}

#[test]
fn test_listener_subscribed_once_per_key() {
    let registry = AuthRegistry::new();
    let listener = Arc::new(RecordingListener::default());

    // repeated lookups with the same listener must not duplicate delivery
    for _ in 0..3 {
        registry.lookup(
            Some("L"),
            Some("A"),
            Some(listener.clone() as Arc<dyn RegistryListener>),
        );
    }
    registry.register(Some(provider()), Some("L"), Some("A"), None);
    assert_eq!(listener.events().len(), 1);
}

#[test]
fn test_detach_listener_returns_subscription_ids() {
    let registry = AuthRegistry::new();
    let listener = Arc::new(RecordingListener::default()) as Arc<dyn RegistryListener>;

    registry.lookup(Some("L"), Some("A"), Some(listener.clone()));
    registry.lookup(Some("L"), Some("B"), Some(listener.clone()));
    registry.lookup(Some("M"), Some("A"), Some(listener.clone()));

    // detach everything under layer L
    let detached = registry.detach_listener(&listener, Some("L"), None);
    assert_eq!(detached.len(), 2);
    for id in &detached {
        let key = maf_domain::key::RegistrationKey::decode(id).unwrap();
        assert_eq!(key.layer(), Some("L"));
    }
}

#[test]
fn test_detached_listener_no_longer_fires() {
    let registry = AuthRegistry::new();
    let typed = Arc::new(RecordingListener::default());
    let listener = typed.clone() as Arc<dyn RegistryListener>;

    registry.lookup(Some("L"), Some("A"), Some(listener.clone()));
    let detached = registry.detach_listener(&listener, None, None);
    assert_eq!(detached.len(), 1);

    registry.register(Some(provider()), Some("L"), Some("A"), None);
    assert!(typed.events().is_empty());
}

/// Listener that re-enters the registry from its callback
struct ReentrantListener {
    registry: Arc<AuthRegistry>,
    observed: Mutex<Vec<bool>>,
}

impl RegistryListener for ReentrantListener {
    fn notify(&self, layer: Option<&str>, app_context: Option<&str>) -> Result<()> {
        // must not deadlock: notification happens outside the registry lock
        let found = self.registry.lookup(layer, app_context, None).is_some();
        self.observed.lock().unwrap().push(found);
        Ok(())
    }
}

#[test]
fn test_listener_may_reenter_registry() {
    let registry = Arc::new(AuthRegistry::new());
    let listener = Arc::new(ReentrantListener {
        registry: registry.clone(),
        observed: Mutex::new(Vec::new()),
    });

    registry.lookup(
        Some("L"),
        Some("A"),
        Some(listener.clone() as Arc<dyn RegistryListener>),
    );
    registry.register(Some(provider()), Some("L"), Some("A"), None);

    // the re-entrant lookup saw the new binding already applied
    assert_eq!(*listener.observed.lock().unwrap(), vec![true]);
}

#[test]
fn test_failing_listener_does_not_stop_delivery() {
    let registry = AuthRegistry::new();
    let recording = Arc::new(RecordingListener::default());

    // the failing listener subscribes first so it is delivered to first
    registry.lookup(
        Some("L"),
        Some("A"),
        Some(Arc::new(FailingListener) as Arc<dyn RegistryListener>),
    );
    registry.lookup(
        Some("L"),
        Some("A"),
        Some(recording.clone() as Arc<dyn RegistryListener>),
    );

    registry.register(Some(provider()), Some("L"), Some("A"), None);
    assert_eq!(recording.events().len(), 1);
}

#[test]
fn test_constructor_only_entry_self_registers_on_refresh() {
    let store = Arc::new(SeededStore {
        entries: vec![PersistedEntry::constructor_only(
            "self-binding",
            BTreeMap::new(),
        )],
    });
    let registry = AuthRegistry::with_store(store).unwrap();

    // the factory re-entered the registry during refresh to bind itself
    let binding = registry
        .binding(Some("SelfLayer"), None)
        .expect("self-registered binding");
    assert!(!binding.persistent);
    assert_eq!(binding.description.as_deref(), Some("self-bound"));
    assert!(registry.lookup(Some("SelfLayer"), None, None).is_some());
}

#[test]
fn test_registration_ids_tracks_provider_bindings() {
    let registry = AuthRegistry::new();
    let shared = provider();

    let id_a = registry.register(Some(shared.clone()), Some("L"), Some("A"), None);
    let id_b = registry.register(Some(shared.clone()), None, Some("B"), None);
    registry.register(Some(provider()), Some("M"), None, None);

    let mut expected = vec![id_a.clone(), id_b];
    expected.sort();
    assert_eq!(registry.registration_ids(&shared), expected);

    registry.remove(&id_a);
    assert_eq!(registry.registration_ids(&shared).len(), 1);
}

#[test]
fn test_binding_ids_lists_every_binding() {
    let registry = AuthRegistry::new();
    registry.register(Some(provider()), None, None, None);
    registry.register(Some(provider()), Some("L"), None, None);
    assert_eq!(registry.binding_ids().len(), 2);
}
