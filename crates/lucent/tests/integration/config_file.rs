//! Registration from TOML settings files.

use std::io::Write;

use lucent::{Error, IndexKey, IndexRegistry, LucentConfig, SchemaVersion};

const SETTINGS: &str = r#"
[indexes.default]
schema_version = "v2"
writer_memory_budget = 30000000
writer_threads = 1

[indexes.products]
storage = { kind = "memory" }
facets_storage = { kind = "memory" }
empty_reader = "allow"

[indexes.products.facets]
category = { multi_valued = false, hierarchical = false }
tags = { multi_valued = true }
"#;

#[test]
fn test_config_file_registers_every_index() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SETTINGS.as_bytes()).unwrap();

    let config = LucentConfig::load(file.path()).unwrap();
    let registry = IndexRegistry::new();
    assert_eq!(registry.register_from_config(&config).unwrap(), 2);
    assert_eq!(
        registry.keys(),
        vec![IndexKey::DEFAULT, IndexKey::named("products")]
    );

    let mut scope = registry.create_scope();
    let default = registry.resolve(IndexKey::DEFAULT, &mut scope).unwrap();
    assert_eq!(default.configuration().version, SchemaVersion::V2);
    let settings = default.configuration().effective_writer_settings().unwrap();
    assert_eq!(settings.memory_budget_bytes, 30_000_000);

    let products = registry.resolve("products", &mut scope).unwrap();
    assert!(products.taxonomy_writer().is_ok());
    let facets = products.configuration().facets_config_or_default();
    assert!(facets.dim_config("tags").multi_valued);
}

#[test]
fn test_code_overrides_apply_after_config_file() {
    let config = LucentConfig::from_toml_str(SETTINGS).unwrap();
    let registry = IndexRegistry::new();
    registry
        .add_named_index("products", |c| c.version = SchemaVersion::V2)
        .unwrap();
    registry.register_from_config(&config).unwrap();

    let snapshot = registry.snapshot(&IndexKey::named("products")).unwrap();
    assert_eq!(snapshot.version, SchemaVersion::V2);
    assert!(snapshot.has_facets());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let err = LucentConfig::load(temp_dir.path().join("missing.toml")).unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn test_zero_writer_threads_rejected_at_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[indexes.main]\nwriter_threads = 0\n").unwrap();

    let err = LucentConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn test_default_table_is_resolvable_by_name() {
    let config = LucentConfig::from_toml_str(SETTINGS).unwrap();
    let registry = IndexRegistry::new();
    registry.register_from_config(&config).unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("default", &mut scope).unwrap();
    assert!(bundle.key().is_default());
}
