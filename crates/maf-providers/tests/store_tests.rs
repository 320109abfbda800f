//! Backing store persistence semantics, file-backed and in-memory

use std::collections::BTreeMap;
use std::io::Write;

use maf_domain::entry::BindingContext;
use maf_domain::ports::BackingStore;
use maf_providers::store::{FileBackingStore, InMemoryBackingStore};

fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn scope(layer: Option<&str>, app: Option<&str>) -> BindingContext {
    BindingContext::new(layer, app, None)
}

#[test]
fn test_missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileBackingStore::new(dir.path().join("absent.json"));
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn test_store_and_reload_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations.json");

    {
        let store = FileBackingStore::new(&path);
        store
            .store("stack", &props(&[("config", "a.toml")]), Some(&scope(Some("L"), Some("A"))))
            .unwrap();
        store.store("stack", &props(&[]), None).unwrap();
    }

    let store = FileBackingStore::new(&path);
    let entries = store.load_all().unwrap();
    assert_eq!(entries.len(), 2);

    let registration = entries.iter().find(|e| !e.is_constructor_only()).unwrap();
    assert_eq!(registration.plugin, "stack");
    assert_eq!(registration.properties, props(&[("config", "a.toml")]));
    let contexts = registration.contexts.as_ref().unwrap();
    assert_eq!(contexts[0].layer.as_deref(), Some("L"));

    assert!(entries.iter().any(|e| e.is_constructor_only()));
}

#[test]
fn test_store_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/state/registrations.json");
    let store = FileBackingStore::new(&path);
    store.store("stack", &props(&[]), Some(&scope(None, None))).unwrap();
    assert!(path.exists());
}

#[test]
fn test_same_identity_merges_into_one_entry() {
    let store = InMemoryBackingStore::new();
    let properties = props(&[("config", "a.toml")]);

    store.store("stack", &properties, Some(&scope(Some("L"), Some("A")))).unwrap();
    store.store("stack", &properties, Some(&scope(Some("L"), Some("B")))).unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].contexts.as_ref().unwrap().len(), 2);
}

#[test]
fn test_rebinding_scope_reclaims_it_from_other_entries() {
    let store = InMemoryBackingStore::new();
    let target = scope(Some("L"), Some("A"));

    store.store("stack", &props(&[("config", "a.toml")]), Some(&target)).unwrap();
    // the same scope bound to a different identity moves, and the emptied
    // registration entry is pruned
    store.store("stack", &props(&[("config", "b.toml")]), Some(&target)).unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].properties, props(&[("config", "b.toml")]));
}

#[test]
fn test_reclaim_keeps_constructor_only_entries() {
    let store = InMemoryBackingStore::new();
    store.store("stack", &props(&[]), None).unwrap();
    store.store("stack", &props(&[("config", "a.toml")]), Some(&scope(None, None))).unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e.is_constructor_only()));
}

#[test]
fn test_delete_prunes_emptied_entries() {
    let store = InMemoryBackingStore::new();
    let properties = props(&[]);
    store.store("stack", &properties, Some(&scope(Some("L"), Some("A")))).unwrap();
    store.store("stack", &properties, Some(&scope(Some("L"), Some("B")))).unwrap();

    store.delete(&scope(Some("L"), Some("A"))).unwrap();
    assert_eq!(store.entries()[0].contexts.as_ref().unwrap().len(), 1);

    store.delete(&scope(Some("L"), Some("B"))).unwrap();
    assert!(store.entries().is_empty());
}

#[test]
fn test_delete_matches_scope_not_description() {
    let store = InMemoryBackingStore::new();
    let described = BindingContext::new(Some("L"), Some("A"), Some("original"));
    store.store("stack", &props(&[]), Some(&described)).unwrap();

    store.delete(&scope(Some("L"), Some("A"))).unwrap();
    assert!(store.entries().is_empty());
}

#[test]
fn test_malformed_entries_are_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"[
            {{"plugin": "stack", "properties": {{}}, "contexts": [{{"layer": "L", "app_context": null, "description": null}}]}},
            {{"plugin": 42}},
            {{"not-an-entry": true}}
        ]"#
    )
    .unwrap();

    let store = FileBackingStore::new(&path);
    let entries = store.load_all().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].plugin, "stack");
}

#[test]
fn test_unreadable_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations.json");
    std::fs::write(&path, "this is not json").unwrap();

    let store = FileBackingStore::new(&path);
    assert!(store.load_all().is_err());
}

#[test]
fn test_empty_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations.json");
    std::fs::write(&path, "  \n").unwrap();

    let store = FileBackingStore::new(&path);
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn test_file_and_memory_stores_agree() {
    let dir = tempfile::tempdir().unwrap();
    let file = FileBackingStore::new(dir.path().join("registrations.json"));
    let memory = InMemoryBackingStore::new();

    let ops: &[(&str, BTreeMap<String, String>, Option<BindingContext>)] = &[
        ("stack", props(&[("config", "a.toml")]), Some(scope(Some("L"), Some("A")))),
        ("stack", props(&[("config", "a.toml")]), Some(scope(None, Some("B")))),
        ("stack", props(&[]), None),
        ("stack", props(&[("config", "b.toml")]), Some(scope(Some("L"), Some("A")))),
    ];
    for (plugin, properties, context) in ops {
        file.store(plugin, properties, context.as_ref()).unwrap();
        memory.store(plugin, properties, context.as_ref()).unwrap();
    }
    file.delete(&scope(None, Some("B"))).unwrap();
    memory.delete(&scope(None, Some("B"))).unwrap();

    assert_eq!(file.load_all().unwrap(), memory.load_all().unwrap());
}
