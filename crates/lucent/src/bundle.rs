//! The per-scope, per-key set of index resources.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use lucent_core::{IndexConfiguration, IndexKey, Result};

use crate::factory;
use crate::resources::{IndexReader, IndexSearcher, IndexWriter};
use crate::taxonomy::{TaxonomyReader, TaxonomyWriter};

type Lazy<T> = Mutex<Option<Arc<T>>>;

/// Builds the member on first call and hands out the cached `Arc` afterwards.
/// A failed build leaves the slot empty.
fn get_or_try_build<T>(slot: &Lazy<T>, build: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = slot.as_ref() {
        return Ok(Arc::clone(existing));
    }
    let built = Arc::new(build()?);
    *slot = Some(Arc::clone(&built));
    Ok(built)
}

/// Resources of one index within one scope.
///
/// The writer exists as soon as the bundle does. Everything else is built on
/// first access and then reused for the rest of the scope.
pub struct ResourceBundle {
    // Fields drop top to bottom: dependents before what they depend on.
    searcher: Lazy<IndexSearcher>,
    reader: Lazy<IndexReader>,
    taxonomy_reader: Lazy<TaxonomyReader>,
    taxonomy_writer: Lazy<TaxonomyWriter>,
    writer: Arc<IndexWriter>,
    configuration: Arc<IndexConfiguration>,
    key: IndexKey,
}

impl ResourceBundle {
    pub(crate) fn new(
        key: IndexKey,
        configuration: Arc<IndexConfiguration>,
        writer: IndexWriter,
    ) -> Self {
        Self {
            searcher: Mutex::new(None),
            reader: Mutex::new(None),
            taxonomy_reader: Mutex::new(None),
            taxonomy_writer: Mutex::new(None),
            writer: Arc::new(writer),
            configuration,
            key,
        }
    }

    /// Key the bundle was resolved for.
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// The validated configuration the bundle was built from.
    pub fn configuration(&self) -> &Arc<IndexConfiguration> {
        &self.configuration
    }

    /// The index writer.
    pub fn writer(&self) -> Arc<IndexWriter> {
        Arc::clone(&self.writer)
    }

    /// The reader, snapshotting the writer's committed state on first call.
    pub fn reader(&self) -> Result<Arc<IndexReader>> {
        get_or_try_build(&self.reader, || {
            factory::build_reader(&self.writer, self.configuration.empty_reader)
        })
    }

    /// The searcher over [`ResourceBundle::reader`].
    pub fn searcher(&self) -> Result<Arc<IndexSearcher>> {
        get_or_try_build(&self.searcher, || {
            let reader = self.reader()?;
            factory::build_searcher(&reader)
        })
    }

    /// The taxonomy writer; fails unless facets storage is configured.
    pub fn taxonomy_writer(&self) -> Result<Arc<TaxonomyWriter>> {
        get_or_try_build(&self.taxonomy_writer, || {
            factory::build_taxonomy_writer(&self.key, &self.configuration)
        })
    }

    /// The taxonomy reader; fails unless facets storage is configured.
    pub fn taxonomy_reader(&self) -> Result<Arc<TaxonomyReader>> {
        get_or_try_build(&self.taxonomy_reader, || {
            factory::build_taxonomy_reader(&self.key, &self.configuration)
        })
    }

    /// Names of the members built so far, in release order.
    pub fn built_members(&self) -> Vec<&'static str> {
        fn is_built<T>(slot: &Lazy<T>) -> bool {
            slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
        }

        let mut members = Vec::with_capacity(5);
        if is_built(&self.searcher) {
            members.push("searcher");
        }
        if is_built(&self.reader) {
            members.push("reader");
        }
        if is_built(&self.taxonomy_reader) {
            members.push("taxonomy_reader");
        }
        if is_built(&self.taxonomy_writer) {
            members.push("taxonomy_writer");
        }
        members.push("writer");
        members
    }
}

impl fmt::Debug for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBundle")
            .field("key", &self.key)
            .field("built", &self.built_members())
            .finish()
    }
}

impl Drop for ResourceBundle {
    fn drop(&mut self) {
        log::debug!(
            "Releasing resources of index '{}': {}",
            self.key,
            self.built_members().join(", ")
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
