//! Facet taxonomy: stable ordinals for facet paths.
//!
//! The taxonomy is a second tantivy index, kept at the configuration's
//! `facets_storage`, with one document per category path:
//!
//! | Field | Type | Purpose |
//! |-------|------|---------|
//! | `path` | STRING \| STORED | encoded facet path (`/category/Electronics`) |
//! | `ordinal` | u64 INDEXED \| STORED \| FAST | stable ordinal |
//! | `parent` | u64 STORED | ordinal of the parent path |
//!
//! Ordinal 0 is the implicit root. Adding `/category/Electronics` also adds
//! `/category` if it is new. Ordinals never change once committed, so a
//! reopened writer continues where the previous one stopped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use lucent_core::{EmptyReaderPolicy, Error, IndexKey, Result, StorageLocation};
use tantivy::collector::DocSetCollector;
use tantivy::query::AllQuery;
use tantivy::schema::{Facet, Field, INDEXED, FAST, STORED, STRING, Schema, SchemaBuilder, Value};
use tantivy::{Index, IndexSettings, ReloadPolicy, TantivyDocument, TantivyError};

/// Ordinal of the taxonomy root.
pub const ROOT_ORDINAL: u64 = 0;

/// Taxonomy writer memory budget (20MB, one thread).
const TAXONOMY_WRITER_BUDGET: usize = 20_000_000;

// ============================================================================
// Taxonomy index layout
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct TaxonomyFields {
    path: Field,
    ordinal: Field,
    parent: Field,
}

impl TaxonomyFields {
    fn schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        builder.add_text_field("path", STRING | STORED);
        builder.add_u64_field("ordinal", INDEXED | STORED | FAST);
        builder.add_u64_field("parent", STORED);
        builder.build()
    }

    fn from_schema(schema: &Schema, location: &StorageLocation) -> Result<Self> {
        let lookup = |name: &str| {
            schema.get_field(name).map_err(|_| {
                Error::storage(
                    location.describe(),
                    format!("not a taxonomy index (missing field '{name}')"),
                )
            })
        };
        Ok(Self {
            path: lookup("path")?,
            ordinal: lookup("ordinal")?,
            parent: lookup("parent")?,
        })
    }
}

/// One stored category.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Category {
    facet: Facet,
    ordinal: u64,
    parent: u64,
}

fn open_taxonomy_index(location: &StorageLocation, create: bool) -> Result<Option<Index>> {
    let dir = location.open_directory()?;
    let exists = Index::exists(&*dir)
        .map_err(|e| Error::storage(location.describe(), e.to_string()))?;

    let index = if exists {
        Index::open(dir).map_err(|e| Error::storage(location.describe(), e.to_string()))?
    } else if create {
        Index::create(dir, TaxonomyFields::schema(), IndexSettings::default())
            .map_err(|e| Error::storage(location.describe(), e.to_string()))?
    } else {
        return Ok(None);
    };
    Ok(Some(index))
}

fn load_categories(index: &Index, fields: TaxonomyFields) -> Result<Vec<Category>> {
    let reader: tantivy::IndexReader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    let searcher = reader.searcher();

    let mut categories = Vec::new();
    for address in searcher.search(&AllQuery, &DocSetCollector)? {
        let doc = searcher.doc::<TantivyDocument>(address)?;
        let path = doc.get_first(fields.path).and_then(|v| v.as_str());
        let ordinal = doc.get_first(fields.ordinal).and_then(|v| v.as_u64());
        let parent = doc.get_first(fields.parent).and_then(|v| v.as_u64());

        let (Some(path), Some(ordinal), Some(parent)) = (path, ordinal, parent) else {
            return Err(Error::Engine(TantivyError::InvalidArgument(
                "taxonomy entry is missing a stored field".to_string(),
            )));
        };
        let facet = Facet::from_text(path).map_err(|e| {
            Error::Engine(TantivyError::InvalidArgument(format!(
                "invalid taxonomy path '{path}': {e}"
            )))
        })?;
        categories.push(Category {
            facet,
            ordinal,
            parent,
        });
    }
    categories.sort_by_key(|c| c.ordinal);
    Ok(categories)
}

/// Every proper ancestor of `facet` (root excluded), shortest first, then `facet`.
fn lineage(facet: &Facet) -> Vec<Facet> {
    let parts = facet.to_path();
    (1..=parts.len())
        .map(|len| Facet::from_path(parts[..len].iter()))
        .collect()
}

// ============================================================================
// TaxonomyWriter
// ============================================================================

struct WriterState {
    writer: tantivy::IndexWriter,
    ordinals: HashMap<Facet, u64>,
    next_ordinal: u64,
}

/// Assigns and persists ordinals for facet paths.
pub struct TaxonomyWriter {
    key: IndexKey,
    location: String,
    fields: TaxonomyFields,
    state: Mutex<WriterState>,
}

impl TaxonomyWriter {
    /// Open (or create) the taxonomy at `location`.
    pub fn open(key: IndexKey, location: &StorageLocation) -> Result<Self> {
        let index = open_taxonomy_index(location, true)?
            .ok_or_else(|| Error::storage(location.describe(), "taxonomy could not be created"))?;
        let fields = TaxonomyFields::from_schema(&index.schema(), location)?;

        let categories = load_categories(&index, fields)?;
        let next_ordinal = categories.last().map_or(ROOT_ORDINAL, |c| c.ordinal) + 1;
        let ordinals = categories
            .into_iter()
            .map(|c| (c.facet, c.ordinal))
            .collect::<HashMap<_, _>>();

        let writer: tantivy::IndexWriter = index
            .writer_with_num_threads(1, TAXONOMY_WRITER_BUDGET)
            .map_err(|e| Error::storage(location.describe(), e.to_string()))?;

        log::debug!(
            "Opened taxonomy writer for index '{key}' at {} ({} categories)",
            location.describe(),
            ordinals.len()
        );

        Ok(Self {
            key,
            location: location.describe(),
            fields,
            state: Mutex::new(WriterState {
                writer,
                ordinals,
                next_ordinal,
            }),
        })
    }

    /// Key of the index this taxonomy belongs to.
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// Ordinal of `facet`, adding it (and any missing ancestors) if new.
    pub fn add_category(&self, facet: &Facet) -> Result<u64> {
        if facet.is_root() {
            return Ok(ROOT_ORDINAL);
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut parent = ROOT_ORDINAL;
        for path in lineage(facet) {
            if let Some(&ordinal) = state.ordinals.get(&path) {
                parent = ordinal;
                continue;
            }

            let ordinal = state.next_ordinal;
            let mut doc = TantivyDocument::new();
            doc.add_text(self.fields.path, path.to_string());
            doc.add_u64(self.fields.ordinal, ordinal);
            doc.add_u64(self.fields.parent, parent);
            state.writer.add_document(doc)?;

            state.ordinals.insert(path, ordinal);
            state.next_ordinal += 1;
            parent = ordinal;
        }
        Ok(parent)
    }

    /// Ordinal of `facet` if it was already added.
    pub fn get_ordinal(&self, facet: &Facet) -> Option<u64> {
        if facet.is_root() {
            return Some(ROOT_ORDINAL);
        }
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.ordinals.get(facet).copied()
    }

    /// Number of categories, root included.
    pub fn size(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.ordinals.len() + 1
    }

    /// Persist added categories.
    pub fn commit(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let opstamp = state.writer.commit()?;
        log::debug!(
            "Committed taxonomy for index '{}' ({} categories)",
            self.key,
            state.ordinals.len()
        );
        Ok(opstamp)
    }
}

impl fmt::Debug for TaxonomyWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxonomyWriter")
            .field("key", &self.key)
            .field("location", &self.location)
            .field("size", &self.size())
            .finish()
    }
}

impl Drop for TaxonomyWriter {
    fn drop(&mut self) {
        log::debug!(
            "Releasing taxonomy writer for index '{}' ({})",
            self.key,
            self.location
        );
    }
}

// ============================================================================
// TaxonomyReader
// ============================================================================

/// Read-only snapshot of a committed taxonomy.
pub struct TaxonomyReader {
    key: IndexKey,
    ordinals: HashMap<Facet, u64>,
    paths: HashMap<u64, Facet>,
    parents: HashMap<u64, u64>,
    children: HashMap<u64, Vec<u64>>,
}

impl TaxonomyReader {
    /// Open a snapshot of the taxonomy at `location`.
    ///
    /// A location without a committed taxonomy yields an empty snapshot, or
    /// [`Error::ReaderUnavailable`] under [`EmptyReaderPolicy::RequireCommitted`].
    pub fn open(
        key: IndexKey,
        location: &StorageLocation,
        policy: EmptyReaderPolicy,
    ) -> Result<Self> {
        let categories = match open_taxonomy_index(location, false)? {
            Some(index) => {
                let fields = TaxonomyFields::from_schema(&index.schema(), location)?;
                load_categories(&index, fields)?
            }
            None => Vec::new(),
        };

        if categories.is_empty() && policy == EmptyReaderPolicy::RequireCommitted {
            return Err(Error::reader(format!(
                "no committed taxonomy for index '{key}' at {}",
                location.describe()
            )));
        }

        let mut reader = Self {
            key,
            ordinals: HashMap::with_capacity(categories.len()),
            paths: HashMap::with_capacity(categories.len()),
            parents: HashMap::with_capacity(categories.len()),
            children: HashMap::new(),
        };
        for category in categories {
            reader
                .children
                .entry(category.parent)
                .or_default()
                .push(category.ordinal);
            reader.parents.insert(category.ordinal, category.parent);
            reader.ordinals.insert(category.facet.clone(), category.ordinal);
            reader.paths.insert(category.ordinal, category.facet);
        }

        log::debug!(
            "Opened taxonomy reader for index '{}' ({} categories)",
            reader.key,
            reader.ordinals.len()
        );
        Ok(reader)
    }

    /// Key of the index this taxonomy belongs to.
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// Ordinal of `facet`, if it exists in the snapshot.
    pub fn get_ordinal(&self, facet: &Facet) -> Option<u64> {
        if facet.is_root() {
            return Some(ROOT_ORDINAL);
        }
        self.ordinals.get(facet).copied()
    }

    /// Path of `ordinal`, if it exists in the snapshot.
    pub fn get_path(&self, ordinal: u64) -> Option<&Facet> {
        self.paths.get(&ordinal)
    }

    /// Parent ordinal of `ordinal`; `None` for the root and unknown ordinals.
    pub fn parent(&self, ordinal: u64) -> Option<u64> {
        self.parents.get(&ordinal).copied()
    }

    /// Child ordinals of `ordinal`, in creation order.
    pub fn children(&self, ordinal: u64) -> &[u64] {
        self.children.get(&ordinal).map_or(&[], Vec::as_slice)
    }

    /// Top-level dimension names, in creation order.
    pub fn dims(&self) -> Vec<String> {
        self.children(ROOT_ORDINAL)
            .iter()
            .filter_map(|ordinal| self.get_path(*ordinal))
            .filter_map(|facet| facet.to_path().first().map(|s| s.to_string()))
            .collect()
    }

    /// Number of categories, root included.
    pub fn size(&self) -> usize {
        self.ordinals.len() + 1
    }
}

impl fmt::Debug for TaxonomyReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxonomyReader")
            .field("key", &self.key)
            .field("size", &self.size())
            .finish()
    }
}

impl Drop for TaxonomyReader {
    fn drop(&mut self) {
        log::debug!("Releasing taxonomy reader for index '{}'", self.key);
    }
}

// ============================================================================
// Tests
// ============================================================================
