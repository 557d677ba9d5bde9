//! File-based index settings.
//!
//! Hosts can describe their indexes in TOML instead of code:
//!
//! ```toml
//! [indexes.main]
//! storage = { kind = "path", path = "/var/lib/app/main" }
//! facets_storage = { kind = "memory" }
//! schema_version = "v2"
//! writer_memory_budget = 50000000
//! writer_threads = 1
//! empty_reader = "allow"
//!
//! [indexes.main.facets]
//! category = { hierarchical = true }
//! tags = { multi_valued = true }
//! ```
//!
//! The index named `default` (or the empty name) is the unnamed index.
//! Each entry becomes a [`ConfigurationOverlay`] through
//! [`IndexSettings::to_overlay`]; keys the file leaves out keep whatever was
//! registered before, and defaults still fill the remaining holes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyzer::Analyzer;
use crate::config::{
    ConfigurationOverlay, EmptyReaderPolicy, IndexConfiguration, SchemaVersion, WriterSettings,
};
use crate::error::{Error, Result};
use crate::facets::FacetsConfig;
use crate::key::{DEFAULT_INDEX_NAME, IndexKey};
use crate::storage::StorageLocation;

/// Storage as written in a settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageSettings {
    /// In-memory store, created once when the settings are registered.
    Memory,
    /// Persistent store at `path`.
    Path {
        /// Index directory.
        path: PathBuf,
    },
}

impl StorageSettings {
    /// Materialize the storage location.
    pub fn to_location(&self) -> StorageLocation {
        match self {
            Self::Memory => StorageLocation::in_memory(),
            Self::Path { path } => StorageLocation::at(path),
        }
    }
}

/// Settings for one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSettings {
    /// Index storage; defaulted to memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSettings>,

    /// Taxonomy storage; facets are disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets_storage: Option<StorageSettings>,

    /// Schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<SchemaVersion>,

    /// Writer memory budget in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_memory_budget: Option<usize>,

    /// Writer thread count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_threads: Option<usize>,

    /// Empty-reader policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_reader: Option<EmptyReaderPolicy>,

    /// Facet dimension configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetsConfig>,
}

impl IndexSettings {
    /// The overlay these settings describe: only keys present in the file
    /// are set.
    ///
    /// Writer tuning needs an analyzer, so setting either writer field pins
    /// the standard analyzer of the configured version.
    pub fn to_overlay(&self) -> ConfigurationOverlay {
        let mut overlay = ConfigurationOverlay {
            version: self.schema_version,
            storage: self.storage.as_ref().map(StorageSettings::to_location),
            facets_storage: self
                .facets_storage
                .as_ref()
                .map(StorageSettings::to_location),
            facets_config: self.facets.clone(),
            empty_reader: self.empty_reader,
            ..ConfigurationOverlay::default()
        };

        if self.writer_memory_budget.is_some() || self.writer_threads.is_some() {
            let version = self.schema_version.unwrap_or_default();
            let analyzer = Analyzer::standard(version);
            let mut writer = WriterSettings::new(version, analyzer.clone());
            if let Some(budget) = self.writer_memory_budget {
                writer = writer.with_memory_budget(budget);
            }
            if let Some(threads) = self.writer_threads {
                writer = writer.with_num_threads(threads);
            }
            overlay.analyzer = Some(analyzer);
            overlay.writer_settings = Some(writer);
        }

        overlay
    }

    /// The base record these settings describe on their own.
    pub fn to_configuration(&self) -> IndexConfiguration {
        let mut config = IndexConfiguration::new();
        self.to_overlay().apply_to(&mut config);
        config
    }
}

/// A settings file: one [`IndexSettings`] per index name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LucentConfig {
    /// Index settings keyed by index name.
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexSettings>,
}

impl LucentConfig {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse settings: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        log::debug!("Loading index settings from {}", path.display());
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Entries paired with the key they register under.
    pub fn entries(&self) -> impl Iterator<Item = (IndexKey, &IndexSettings)> {
        self.indexes
            .iter()
            .map(|(name, settings)| (IndexKey::named(name.as_str()), settings))
    }

    fn check(&self) -> Result<()> {
        let aliases = self
            .indexes
            .keys()
            .filter(|name| IndexKey::named(name.as_str()).is_default())
            .count();
        if aliases > 1 {
            return Err(Error::config(format!(
                "both \"\" and \"{DEFAULT_INDEX_NAME}\" describe the unnamed index"
            )));
        }
        if let Some(name) = self
            .indexes
            .iter()
            .find(|(_, settings)| settings.writer_threads == Some(0))
            .map(|(name, _)| name)
        {
            return Err(Error::config(format!(
                "index '{name}': writer_threads must be at least 1"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
