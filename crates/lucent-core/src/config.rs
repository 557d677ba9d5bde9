//! The per-index configuration record.
//!
//! [`IndexConfiguration`] is plain data describing how one index is built.
//! The registry produces a fresh record for every scope: it starts from the
//! registered base record, runs the
//! [`DefaultIndexConfigurator`](crate::defaults::DefaultIndexConfigurator),
//! applies the caller's overrides in order, and validates the result with
//! [`IndexConfigurationValidator`](crate::validation::IndexConfigurationValidator).
//! Once resources are built from a record it is shared behind an `Arc` and
//! never mutated again.
//!
//! | Field | Required | Default |
//! |-------|----------|---------|
//! | `version` | always set | [`SchemaVersion::V1`] |
//! | `storage` | yes | fresh in-memory store |
//! | `facets_storage` | no | none (facets unavailable) |
//! | `analyzer` | yes | [`Analyzer::standard`] for `version` |
//! | `writer_settings` | no | derived from `version` + `analyzer` |
//! | `facets_config` | no | none |
//! | `schema` | no | the engine's default schema |
//! | `empty_reader` | no | [`EmptyReaderPolicy::Allow`] |

use std::fmt;

use serde::{Deserialize, Serialize};
use tantivy::schema::Schema;

use crate::analyzer::Analyzer;
use crate::facets::FacetsConfig;
use crate::storage::StorageLocation;

/// On-disk format generation of an index.
///
/// Selects the standard analyzer chain. The version **must** match the
/// analyzer actually configured; this is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Lowercased simple tokens.
    #[default]
    V1,
    /// V1 plus English stemming.
    V2,
}

impl SchemaVersion {
    /// The most recent version.
    pub const LATEST: SchemaVersion = SchemaVersion::V2;
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// What to do when a reader is requested over an index with no committed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReaderPolicy {
    /// Hand out an empty but valid reader.
    #[default]
    Allow,
    /// Fail with [`Error::ReaderUnavailable`](crate::Error::ReaderUnavailable).
    RequireCommitted,
}

/// Writer construction parameters.
#[derive(Debug, Clone)]
pub struct WriterSettings {
    /// Schema version the writer was derived from.
    pub version: SchemaVersion,
    /// Analyzer registered on the index when the writer opens it.
    pub analyzer: Analyzer,
    /// Indexing memory budget shared by all indexing threads.
    pub memory_budget_bytes: usize,
    /// Number of indexing threads; `None` lets the engine decide.
    pub num_threads: Option<usize>,
}

impl WriterSettings {
    /// Default indexing memory budget (50MB).
    pub const DEFAULT_MEMORY_BUDGET: usize = 50_000_000;

    /// Derive writer settings from a version and an analyzer.
    pub fn new(version: SchemaVersion, analyzer: Analyzer) -> Self {
        Self {
            version,
            analyzer,
            memory_budget_bytes: Self::DEFAULT_MEMORY_BUDGET,
            num_threads: None,
        }
    }

    /// Override the memory budget.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    /// Pin the number of indexing threads.
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }
}

/// A configuration field, as reported by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// [`IndexConfiguration::storage`].
    Storage,
    /// [`IndexConfiguration::analyzer`].
    Analyzer,
}

impl ConfigField {
    /// Fields that must be set before any resource is built.
    pub const REQUIRED: [ConfigField; 2] = [ConfigField::Storage, ConfigField::Analyzer];

    /// Field name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Analyzer => "analyzer",
        }
    }

    /// Whether `config` has a value for this field.
    pub fn is_set(&self, config: &IndexConfiguration) -> bool {
        match self {
            Self::Storage => config.storage.is_some(),
            Self::Analyzer => config.analyzer.is_some(),
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The configuration for one index.
#[derive(Debug, Clone, Default)]
pub struct IndexConfiguration {
    /// Format version; must match the analyzer.
    pub version: SchemaVersion,
    /// Where the index lives.
    pub storage: Option<StorageLocation>,
    /// Where the taxonomy lives; `None` disables facet components.
    pub facets_storage: Option<StorageLocation>,
    /// Analyzer for every text field of the index.
    pub analyzer: Option<Analyzer>,
    /// Explicit writer settings; derived from `version` + `analyzer` when unset.
    pub writer_settings: Option<WriterSettings>,
    /// Facet dimension configuration; only used with `facets_storage`.
    pub facets_config: Option<FacetsConfig>,
    /// Document schema for newly created indexes.
    pub schema: Option<Schema>,
    /// Reader behaviour on an index without committed data.
    pub empty_reader: EmptyReaderPolicy,
}

impl IndexConfiguration {
    /// An empty record with the default version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema version.
    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the index storage.
    pub fn with_storage(mut self, storage: StorageLocation) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the taxonomy storage.
    pub fn with_facets_storage(mut self, storage: StorageLocation) -> Self {
        self.facets_storage = Some(storage);
        self
    }

    /// Set the analyzer.
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Set explicit writer settings.
    pub fn with_writer_settings(mut self, settings: WriterSettings) -> Self {
        self.writer_settings = Some(settings);
        self
    }

    /// Set the facets configuration.
    pub fn with_facets_config(mut self, facets: FacetsConfig) -> Self {
        self.facets_config = Some(facets);
        self
    }

    /// Set the document schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the empty-reader policy.
    pub fn with_empty_reader(mut self, policy: EmptyReaderPolicy) -> Self {
        self.empty_reader = policy;
        self
    }

    /// Whether taxonomy components can be built from this record.
    pub fn has_facets(&self) -> bool {
        self.facets_storage.is_some()
    }

    /// The writer settings to build with.
    ///
    /// Returns the explicit settings if present, otherwise settings derived
    /// from `version` and `analyzer`. `None` only when neither is available,
    /// which validation rules out.
    pub fn effective_writer_settings(&self) -> Option<WriterSettings> {
        match &self.writer_settings {
            Some(settings) => Some(settings.clone()),
            None => self
                .analyzer
                .as_ref()
                .map(|analyzer| WriterSettings::new(self.version, analyzer.clone())),
        }
    }

    /// The facets configuration, or an empty one.
    pub fn facets_config_or_default(&self) -> FacetsConfig {
        self.facets_config.clone().unwrap_or_default()
    }
}

/// A partial [`IndexConfiguration`].
///
/// Only the fields that are `Some` are written when the overlay is applied,
/// so several overlays registered for one key compose field by field.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationOverlay {
    /// Format version.
    pub version: Option<SchemaVersion>,
    /// Index storage.
    pub storage: Option<StorageLocation>,
    /// Taxonomy storage.
    pub facets_storage: Option<StorageLocation>,
    /// Analyzer.
    pub analyzer: Option<Analyzer>,
    /// Explicit writer settings.
    pub writer_settings: Option<WriterSettings>,
    /// Facet dimension configuration.
    pub facets_config: Option<FacetsConfig>,
    /// Document schema.
    pub schema: Option<Schema>,
    /// Empty-reader policy.
    pub empty_reader: Option<EmptyReaderPolicy>,
}

impl ConfigurationOverlay {
    /// An overlay that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema version.
    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the index storage.
    pub fn with_storage(mut self, storage: StorageLocation) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the taxonomy storage.
    pub fn with_facets_storage(mut self, storage: StorageLocation) -> Self {
        self.facets_storage = Some(storage);
        self
    }

    /// Set the analyzer.
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Set explicit writer settings.
    pub fn with_writer_settings(mut self, settings: WriterSettings) -> Self {
        self.writer_settings = Some(settings);
        self
    }

    /// Set the facets configuration.
    pub fn with_facets_config(mut self, facets: FacetsConfig) -> Self {
        self.facets_config = Some(facets);
        self
    }

    /// Set the document schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the empty-reader policy.
    pub fn with_empty_reader(mut self, policy: EmptyReaderPolicy) -> Self {
        self.empty_reader = Some(policy);
        self
    }

    /// Write the set fields onto `base`, leaving the others untouched.
    pub fn apply_to(self, base: &mut IndexConfiguration) {
        if let Some(version) = self.version {
            base.version = version;
        }
        if let Some(policy) = self.empty_reader {
            base.empty_reader = policy;
        }
        if self.storage.is_some() {
            base.storage = self.storage;
        }
        if self.facets_storage.is_some() {
            base.facets_storage = self.facets_storage;
        }
        if self.analyzer.is_some() {
            base.analyzer = self.analyzer;
        }
        if self.writer_settings.is_some() {
            base.writer_settings = self.writer_settings;
        }
        if self.facets_config.is_some() {
            base.facets_config = self.facets_config;
        }
        if self.schema.is_some() {
            base.schema = self.schema;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
