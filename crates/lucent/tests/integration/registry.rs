//! Integration tests for registration and scoped resolution.

use std::sync::Arc;

use lucent::{ConfigField, Error, IndexKey, IndexRegistry, StorageLocation};

use crate::common::{index_names, use_named_schema};

#[test]
fn test_add_index_resolves_writer() {
    let registry = IndexRegistry::new();
    registry.register(IndexKey::DEFAULT, None).unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve(IndexKey::DEFAULT, &mut scope).unwrap();
    assert_eq!(bundle.key(), &IndexKey::DEFAULT);
    assert_eq!(bundle.writer().key(), &IndexKey::DEFAULT);
}

#[test]
fn test_named_index_resolves_every_member() {
    let registry = IndexRegistry::new();
    registry
        .add_named_index("test", |config| {
            config.facets_storage = Some(StorageLocation::in_memory());
        })
        .unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("test", &mut scope).unwrap();
    bundle.reader().unwrap();
    bundle.searcher().unwrap();
    bundle.taxonomy_writer().unwrap().commit().unwrap();
    bundle.taxonomy_reader().unwrap();
    assert_eq!(bundle.built_members().len(), 5);
}

#[test]
fn test_unknown_index_is_reported() {
    let registry = IndexRegistry::new();
    registry.add_named_index("known", |_| {}).unwrap();

    let mut scope = registry.create_scope();
    let err = registry.resolve("unknown", &mut scope).unwrap_err();
    assert!(matches!(err, Error::UnknownIndex { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn test_invalid_configuration_names_all_missing_fields() {
    let registry = IndexRegistry::new();
    registry
        .add_named_index("broken", |config| {
            config.storage = None;
            config.analyzer = None;
        })
        .unwrap();

    let mut scope = registry.create_scope();
    let err = registry.resolve("broken", &mut scope).unwrap_err();
    assert!(matches!(
        &err,
        Error::ConfigurationInvalid { key, .. } if *key == IndexKey::named("broken")
    ));
    assert_eq!(
        err.missing_fields(),
        &[ConfigField::Storage, ConfigField::Analyzer]
    );
    assert!(scope.is_empty());
}

#[test]
fn test_keys_are_isolated() {
    let registry = IndexRegistry::new();
    registry.add_named_index("one", use_named_schema).unwrap();
    registry.add_named_index("two", use_named_schema).unwrap();

    let mut scope = registry.create_scope();
    let one = registry.resolve("one", &mut scope).unwrap();
    let two = registry.resolve("two", &mut scope).unwrap();
    index_names(&one.writer(), &["only in one"]);

    assert_eq!(one.reader().unwrap().num_docs(), 1);
    assert_eq!(two.reader().unwrap().num_docs(), 0);
    assert_eq!(scope.len(), 2);
}

#[test]
fn test_scope_caching() {
    let registry = IndexRegistry::new();
    registry.add_index(|_| {}).unwrap();

    let mut scope = registry.create_scope();
    let a = registry.resolve(IndexKey::DEFAULT, &mut scope).unwrap();
    let b = registry.resolve("", &mut scope).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a.searcher().unwrap(), &b.searcher().unwrap()));

    let mut other = registry.create_scope();
    let c = registry.resolve(IndexKey::DEFAULT, &mut other).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn test_shared_registry_across_threads() {
    let registry = Arc::new(IndexRegistry::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.add_named_index(format!("index-{i}"), |_| {}).unwrap();
                let mut scope = registry.create_scope();
                registry
                    .resolve(IndexKey::named(format!("index-{i}")), &mut scope)
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.keys().len(), 4);
}

#[test]
fn test_bundle_outlives_scope() {
    let registry = IndexRegistry::new();
    registry.add_named_index("kept", use_named_schema).unwrap();

    let bundle = {
        let mut scope = registry.create_scope();
        registry.resolve("kept", &mut scope).unwrap()
    };
    index_names(&bundle.writer(), &["still usable"]);
    assert_eq!(bundle.reader().unwrap().num_docs(), 1);
}
