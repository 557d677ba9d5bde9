//! Index resources handed out by the registry.
//!
//! - [`IndexWriter`]: the exclusive write handle of an index
//! - [`IndexReader`]: a point-in-time snapshot of the committed state
//! - [`IndexSearcher`]: query execution over one reader snapshot
//!
//! All three are thin wrappers over their tantivy counterparts. They carry
//! the key of the index they belong to and convert engine errors into
//! [`lucent_core::Error`].

use std::fmt;
use std::sync::{PoisonError, RwLock};

use lucent_core::{Error, IndexKey, Result};
use tantivy::collector::{Collector, Count};
use tantivy::query::{Query, QueryParser};
use tantivy::schema::{Field, FieldType, Schema};
use tantivy::{DocAddress, Index, Searcher, TantivyDocument, TantivyError, Term};

// ============================================================================
// IndexWriter
// ============================================================================

/// Exclusive write handle bound to one storage location.
///
/// Adds and deletes are staged until [`IndexWriter::commit`]; readers only
/// ever see committed state.
pub struct IndexWriter {
    key: IndexKey,
    location: String,
    index: Index,
    schema: Schema,
    inner: RwLock<tantivy::IndexWriter>,
}

impl IndexWriter {
    pub(crate) fn new(
        key: IndexKey,
        location: String,
        index: Index,
        inner: tantivy::IndexWriter,
    ) -> Self {
        let schema = index.schema();
        Self {
            key,
            location,
            index,
            schema,
            inner: RwLock::new(inner),
        }
    }

    /// Key of the index this writer belongs to.
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// The underlying tantivy index.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Schema of the index.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<Field> {
        Ok(self.schema.get_field(name)?)
    }

    /// Stage a document.
    pub fn add_document(&self, doc: TantivyDocument) -> Result<u64> {
        let writer = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(writer.add_document(doc)?)
    }

    /// Stage the deletion of every document containing `term`.
    pub fn delete_term(&self, term: Term) -> u64 {
        let writer = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        writer.delete_term(term)
    }

    /// Stage the deletion of every document.
    pub fn delete_all_documents(&self) -> Result<u64> {
        let writer = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(writer.delete_all_documents()?)
    }

    /// Make staged changes durable and visible to readers opened afterwards.
    pub fn commit(&self) -> Result<u64> {
        let mut writer = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let opstamp = writer.commit()?;
        log::debug!("Committed index '{}' at opstamp {opstamp}", self.key);
        Ok(opstamp)
    }

    /// Discard every change staged since the last commit.
    pub fn rollback(&self) -> Result<u64> {
        let mut writer = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Ok(writer.rollback()?)
    }
}

impl fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexWriter")
            .field("key", &self.key)
            .field("location", &self.location)
            .finish()
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        log::debug!("Releasing writer for index '{}' ({})", self.key, self.location);
    }
}

// ============================================================================
// IndexReader
// ============================================================================

/// Read-only snapshot of an index's committed state.
///
/// The snapshot is taken when the reader is built and never reloads.
pub struct IndexReader {
    key: IndexKey,
    index: Index,
    inner: tantivy::IndexReader,
}

impl IndexReader {
    pub(crate) fn new(key: IndexKey, index: Index, inner: tantivy::IndexReader) -> Self {
        Self { key, index, inner }
    }

    /// Key of the index this reader belongs to.
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// The underlying tantivy index.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Number of live documents in the snapshot.
    pub fn num_docs(&self) -> u64 {
        self.inner.searcher().num_docs()
    }

    /// Whether the snapshot holds no documents.
    pub fn is_empty(&self) -> bool {
        self.num_docs() == 0
    }

    pub(crate) fn searcher(&self) -> Searcher {
        self.inner.searcher()
    }
}

impl fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexReader")
            .field("key", &self.key)
            .field("num_docs", &self.num_docs())
            .finish()
    }
}

impl Drop for IndexReader {
    fn drop(&mut self) {
        log::debug!("Releasing reader for index '{}'", self.key);
    }
}

// ============================================================================
// IndexSearcher
// ============================================================================

/// Query execution over one reader snapshot.
pub struct IndexSearcher {
    key: IndexKey,
    index: Index,
    inner: Searcher,
}

impl IndexSearcher {
    pub(crate) fn new(key: IndexKey, index: Index, inner: Searcher) -> Self {
        Self { key, index, inner }
    }

    /// Key of the index this searcher belongs to.
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// Schema of the searched index.
    pub fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    /// The underlying tantivy searcher.
    pub fn inner(&self) -> &Searcher {
        &self.inner
    }

    /// Number of live documents visible to this searcher.
    pub fn num_docs(&self) -> u64 {
        self.inner.num_docs()
    }

    /// Run `query` through `collector`.
    pub fn search<C: Collector>(&self, query: &dyn Query, collector: &C) -> Result<C::Fruit> {
        Ok(self.inner.search(query, collector)?)
    }

    /// Number of documents matching `query`.
    pub fn count(&self, query: &dyn Query) -> Result<usize> {
        self.search(query, &Count)
    }

    /// Fetch a stored document.
    pub fn doc(&self, address: DocAddress) -> Result<TantivyDocument> {
        Ok(self.inner.doc::<TantivyDocument>(address)?)
    }

    /// A query parser over the given default fields, using the index analyzer.
    pub fn query_parser(&self, default_fields: Vec<Field>) -> QueryParser {
        QueryParser::for_index(&self.index, default_fields)
    }

    /// Parse `query` with every indexed text field as a default field.
    ///
    /// Field-qualified clauses (`name:"brown fox"`) work regardless.
    pub fn parse_query(&self, query: &str) -> Result<Box<dyn Query>> {
        let default_fields = self
            .schema()
            .fields()
            .filter(|(_, entry)| match entry.field_type() {
                FieldType::Str(options) => options.get_indexing_options().is_some(),
                _ => false,
            })
            .map(|(field, _)| field)
            .collect();

        self.query_parser(default_fields)
            .parse_query(query)
            .map_err(|e| Error::Engine(TantivyError::InvalidArgument(format!("{query}: {e}"))))
    }
}

impl fmt::Debug for IndexSearcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSearcher")
            .field("key", &self.key)
            .field("num_docs", &self.num_docs())
            .finish()
    }
}
