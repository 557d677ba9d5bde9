//! Resource construction.
//!
//! Pure functions from a validated [`IndexConfiguration`] (or a previously
//! built resource) to the next resource in the chain:
//!
//! ```text
//! config -> IndexWriter -> IndexReader -> IndexSearcher
//! config -> TaxonomyWriter
//! config -> TaxonomyReader
//! ```
//!
//! The registry calls these in dependency order. They can also be used
//! directly when no registry is wanted.

use lucent_core::{
    ConfigField, EmptyReaderPolicy, Error, IndexConfiguration, IndexKey, Result, StorageLocation,
};
use tantivy::{Index, ReloadPolicy, TantivyError};

use crate::resources::{IndexReader, IndexSearcher, IndexWriter};
use crate::schema::{FacetFields, effective_schema};
use crate::taxonomy::{TaxonomyReader, TaxonomyWriter};

/// Name under which the configured analyzer is registered on each index.
pub const DEFAULT_TOKENIZER: &str = "default";

fn missing(key: &IndexKey, field: ConfigField) -> Error {
    Error::ConfigurationInvalid {
        key: key.clone(),
        missing_fields: vec![field],
    }
}

fn facets_storage<'a>(key: &IndexKey, config: &'a IndexConfiguration) -> Result<&'a StorageLocation> {
    config
        .facets_storage
        .as_ref()
        .ok_or_else(|| Error::FacetsNotConfigured { key: key.clone() })
}

/// Open or create the index at the configured storage and take its writer.
///
/// # Errors
///
/// - [`Error::StorageUnavailable`] if the location cannot be opened or
///   created, or another writer holds its lock
/// - [`Error::ConfigurationInvalid`] if the record was not validated
/// - [`Error::Config`] if the writer settings pin zero threads
pub fn build_writer(key: &IndexKey, config: &IndexConfiguration) -> Result<IndexWriter> {
    let storage = config
        .storage
        .as_ref()
        .ok_or_else(|| missing(key, ConfigField::Storage))?;
    let settings = config
        .effective_writer_settings()
        .ok_or_else(|| missing(key, ConfigField::Analyzer))?;
    if settings.num_threads == Some(0) {
        return Err(Error::config(format!(
            "index '{key}': writer thread count must be at least 1"
        )));
    }
    let location = storage.describe();

    let dir = storage.open_directory()?;
    let exists =
        Index::exists(&*dir).map_err(|e| Error::storage(&location, e.to_string()))?;

    let index = if exists {
        log::debug!("Opening existing index '{key}' at {location}");
        Index::open(dir)
    } else {
        log::debug!("Creating index '{key}' at {location}");
        Index::create(dir, effective_schema(config), tantivy::IndexSettings::default())
    }
    .map_err(|e| Error::storage(&location, e.to_string()))?;

    if config.has_facets() && FacetFields::from_schema(&index.schema()).is_none() {
        log::warn!(
            "Index '{key}' at {location} predates its facets storage and has no facet fields"
        );
    }

    index
        .tokenizers()
        .register(DEFAULT_TOKENIZER, settings.analyzer.text_analyzer());

    let writer: std::result::Result<tantivy::IndexWriter, TantivyError> =
        match settings.num_threads {
            Some(threads) => index.writer_with_num_threads(threads, settings.memory_budget_bytes),
            None => index.writer(settings.memory_budget_bytes),
        };
    let writer = writer.map_err(|e| match e {
        TantivyError::LockFailure(..) => Error::storage(&location, e.to_string()),
        other => Error::Engine(other),
    })?;

    log::debug!(
        "Built writer for index '{key}' (analyzer {}, budget {} bytes)",
        settings.analyzer.name(),
        settings.memory_budget_bytes
    );
    Ok(IndexWriter::new(key.clone(), location, index, writer))
}

/// Take a snapshot of the writer's committed state.
///
/// The snapshot never reloads; later commits need a new reader.
///
/// # Errors
///
/// [`Error::ReaderUnavailable`] if the index holds no documents and `policy`
/// is [`EmptyReaderPolicy::RequireCommitted`].
pub fn build_reader(writer: &IndexWriter, policy: EmptyReaderPolicy) -> Result<IndexReader> {
    let inner: tantivy::IndexReader = writer
        .index()
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;

    let num_docs = inner.searcher().num_docs();
    if num_docs == 0 && policy == EmptyReaderPolicy::RequireCommitted {
        return Err(Error::reader(format!(
            "index '{}' has no committed documents",
            writer.key()
        )));
    }

    log::debug!("Built reader for index '{}' ({num_docs} docs)", writer.key());
    Ok(IndexReader::new(
        writer.key().clone(),
        writer.index().clone(),
        inner,
    ))
}

/// Wrap the reader's snapshot in a searcher.
pub fn build_searcher(reader: &IndexReader) -> Result<IndexSearcher> {
    log::debug!("Built searcher for index '{}'", reader.key());
    Ok(IndexSearcher::new(
        reader.key().clone(),
        reader.index().clone(),
        reader.searcher(),
    ))
}

/// Open or create the taxonomy at the configured facets storage.
///
/// # Errors
///
/// [`Error::FacetsNotConfigured`] when `facets_storage` is unset.
pub fn build_taxonomy_writer(key: &IndexKey, config: &IndexConfiguration) -> Result<TaxonomyWriter> {
    let location = facets_storage(key, config)?;
    TaxonomyWriter::open(key.clone(), location)
}

/// Snapshot the committed taxonomy at the configured facets storage.
///
/// # Errors
///
/// - [`Error::FacetsNotConfigured`] when `facets_storage` is unset
/// - [`Error::ReaderUnavailable`] on an empty taxonomy under
///   [`EmptyReaderPolicy::RequireCommitted`]
pub fn build_taxonomy_reader(key: &IndexKey, config: &IndexConfiguration) -> Result<TaxonomyReader> {
    let location = facets_storage(key, config)?;
    TaxonomyReader::open(key.clone(), location, config.empty_reader)
}

// ============================================================================
// Tests
// ============================================================================
