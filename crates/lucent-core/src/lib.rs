//! Lucent Core: configuration records, validation, and defaults.
//!
//! This crate holds everything that describes an index without building it.
//! The `lucent` crate turns these descriptions into tantivy resources.
//!
//! # Modules
//!
//! - [`key`]: index keys, including the reserved default key
//! - [`config`]: the per-index [`IndexConfiguration`] record
//! - [`storage`] / [`analyzer`]: opaque storage and analyzer handles
//! - [`facets`]: facet dimension configuration
//! - [`defaults`]: the [`DefaultIndexConfigurator`]
//! - [`validation`]: the [`IndexConfigurationValidator`]
//! - [`settings`]: TOML settings files
//! - [`error`]: error types and the `Result` alias

pub mod analyzer;
pub mod config;
pub mod defaults;
pub mod error;
pub mod facets;
pub mod key;
pub mod settings;
pub mod storage;
pub mod validation;

// Re-export key types at crate root for convenience
pub use analyzer::Analyzer;
pub use config::{
    ConfigField, ConfigurationOverlay, EmptyReaderPolicy, IndexConfiguration, SchemaVersion,
    WriterSettings,
};
pub use defaults::DefaultIndexConfigurator;
pub use error::{Error, Result};
pub use facets::{DimConfig, FacetsConfig};
pub use key::{DEFAULT_INDEX_NAME, IndexKey};
pub use settings::{IndexSettings, LucentConfig, StorageSettings};
pub use storage::StorageLocation;
pub use validation::{IndexConfigurationValidator, ValidationReport};
