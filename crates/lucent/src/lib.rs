//! Named, scoped tantivy index resources.
//!
//! Lucent wires tantivy's writer, reader and searcher (plus an optional facet
//! taxonomy) into an application under named, independently configured
//! indexes. Configurations are registered up front; resources are built
//! lazily, after defaulting and validation, the first time a scope asks for
//! them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         lucent                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexRegistry (key -> base record + overrides)             │
//! │  └── IndexScope (key -> ResourceBundle, released on drop)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ResourceBundle                                             │
//! │  ├── IndexWriter       (eager)                              │
//! │  ├── IndexReader       (lazy, snapshot of the writer)       │
//! │  ├── IndexSearcher     (lazy, over the reader)              │
//! │  └── TaxonomyWriter / TaxonomyReader (lazy, facets only)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  factory (config -> resource construction)                  │
//! │  facets  (FacetDocument, TaxonomyFacetCounts, drill-down)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration records, validation and defaults live in `lucent-core`
//! and are re-exported here.
//!
//! # Example
//!
//! ```rust,ignore
//! use lucent::{IndexRegistry, StorageLocation};
//!
//! let registry = IndexRegistry::new();
//! registry.add_named_index("products", |config| {
//!     config.facets_storage = Some(StorageLocation::in_memory());
//! })?;
//!
//! let mut scope = registry.create_scope();
//! let products = registry.resolve("products", &mut scope)?;
//! products.writer().add_document(doc)?;
//! products.writer().commit()?;
//!
//! let searcher = products.searcher()?;
//! let hits = searcher.count(searcher.parse_query("body:phone")?.as_ref())?;
//! ```

pub mod bundle;
pub mod facets;
pub mod factory;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod scope;
pub mod taxonomy;

// Re-exports
pub use bundle::ResourceBundle;
pub use facets::{
    DrillDownQuery, FacetDocument, FacetResult, FacetsConfigExt, LabelAndValue,
    TaxonomyFacetCounts,
};
pub use registry::{ConfigureFn, IndexRegistry};
pub use resources::{IndexReader, IndexSearcher, IndexWriter};
pub use schema::{FacetFields, add_facet_fields, default_schema};
pub use scope::IndexScope;
pub use taxonomy::{TaxonomyReader, TaxonomyWriter};

pub use lucent_core::{
    Analyzer, ConfigField, ConfigurationOverlay, DEFAULT_INDEX_NAME, DefaultIndexConfigurator,
    DimConfig, EmptyReaderPolicy, Error, FacetsConfig, IndexConfiguration,
    IndexConfigurationValidator, IndexKey, IndexSettings, LucentConfig, Result, SchemaVersion,
    StorageLocation, WriterSettings,
};
