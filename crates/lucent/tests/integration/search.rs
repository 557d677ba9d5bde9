//! End-to-end search through resolved bundles.

use lucent::{EmptyReaderPolicy, Error, IndexRegistry, StorageLocation};
use tantivy::collector::DocSetCollector;
use tantivy::schema::Value;

use crate::common::{index_names, use_named_schema};

#[test]
fn test_phrase_query_finds_one_document() {
    let registry = IndexRegistry::new();
    registry.add_index(use_named_schema).unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("", &mut scope).unwrap();
    index_names(
        &bundle.writer(),
        &[
            "The quick brown fox jumps over the lazy dog",
            "A brown dog and a quick fox",
            "Foxes are brown",
        ],
    );

    let searcher = bundle.searcher().unwrap();
    let query = searcher.parse_query(r#"name:"brown fox""#).unwrap();
    let hits = searcher.search(query.as_ref(), &DocSetCollector).unwrap();
    assert_eq!(hits.len(), 1);

    let address = hits.into_iter().next().unwrap();
    let doc = searcher.doc(address).unwrap();
    let id_field = searcher.schema().get_field("id").unwrap();
    assert_eq!(doc.get_first(id_field).and_then(|v| v.as_str()), Some("0"));
}

#[test]
fn test_reader_snapshot_ignores_later_commits() {
    let registry = IndexRegistry::new();
    registry.add_index(use_named_schema).unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("", &mut scope).unwrap();
    index_names(&bundle.writer(), &["first"]);

    let reader = bundle.reader().unwrap();
    index_names(&bundle.writer(), &["second"]);
    assert_eq!(reader.num_docs(), 1);
    assert_eq!(bundle.searcher().unwrap().num_docs(), 1);

    // Defaulted in-memory storage is fresh for every scope.
    let mut next = registry.create_scope();
    let fresh = registry.resolve("", &mut next).unwrap();
    assert_eq!(fresh.reader().unwrap().num_docs(), 0);
}

#[test]
fn test_shared_storage_survives_scopes() {
    let storage = StorageLocation::in_memory();
    let registry = IndexRegistry::new();
    let shared = storage.clone();
    registry
        .add_index(move |config| {
            use_named_schema(config);
            config.storage = Some(shared.clone());
        })
        .unwrap();

    {
        let mut scope = registry.create_scope();
        let bundle = registry.resolve("", &mut scope).unwrap();
        index_names(&bundle.writer(), &["persisted across scopes"]);
    }

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("", &mut scope).unwrap();
    assert_eq!(bundle.reader().unwrap().num_docs(), 1);
}

#[test]
fn test_require_committed_reader() {
    let registry = IndexRegistry::new();
    registry
        .add_index(|config| config.empty_reader = EmptyReaderPolicy::RequireCommitted)
        .unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("", &mut scope).unwrap();
    let err = bundle.searcher().unwrap_err();
    assert!(matches!(err, Error::ReaderUnavailable { .. }));
    assert!(err.is_retryable());
}

#[test]
fn test_persistent_index_on_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("index");
    let registry = IndexRegistry::new();
    let location = StorageLocation::at(&path);
    registry
        .add_index(move |config| {
            use_named_schema(config);
            config.storage = Some(location.clone());
        })
        .unwrap();

    {
        let mut scope = registry.create_scope();
        let bundle = registry.resolve("", &mut scope).unwrap();
        index_names(&bundle.writer(), &["on disk"]);
    }

    assert!(StorageLocation::at(&path).contains_index().unwrap());
    let mut scope = registry.create_scope();
    let bundle = registry.resolve("", &mut scope).unwrap();
    let searcher = bundle.searcher().unwrap();
    let query = searcher.parse_query("disk").unwrap();
    assert_eq!(searcher.count(query.as_ref()).unwrap(), 1);
}
