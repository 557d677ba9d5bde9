//! Faceted documents, counting and drill-down.
//!
//! Facets are indexed twice per document: as a tantivy facet in
//! [`FACETS_FIELD`](crate::schema::FACETS_FIELD) (for counting and
//! filtering) and as the taxonomy ordinal in
//! [`FACET_ORDINALS_FIELD`](crate::schema::FACET_ORDINALS_FIELD).
//!
//! ```ignore
//! let doc = FacetDocument::new(doc).with_facet("category", ["Electronics"]);
//! writer.add_document(facets_config.build(writer.schema(), &taxonomy, doc)?)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::iter;

use lucent_core::{Error, FacetsConfig, Result};
use tantivy::collector::FacetCollector;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, QueryClone, TermQuery};
use tantivy::schema::{Facet, Field, IndexRecordOption, Schema};
use tantivy::{TantivyDocument, TantivyError, Term};

use crate::resources::IndexSearcher;
use crate::schema::{FACETS_FIELD, FacetFields};
use crate::taxonomy::{TaxonomyReader, TaxonomyWriter};

fn facet_fields(schema: &Schema) -> Result<FacetFields> {
    FacetFields::from_schema(schema).ok_or_else(|| {
        Error::Engine(TantivyError::SchemaError(format!(
            "schema has no '{FACETS_FIELD}' field; the index was not created with facets storage"
        )))
    })
}

fn dim_path_facet<S: AsRef<str>>(dim: &str, path: &[S]) -> Facet {
    let parts: Vec<&str> = path.iter().map(|s| s.as_ref()).collect();
    Facet::from_path(iter::once(dim).chain(parts))
}

// ============================================================================
// Document assembly
// ============================================================================

/// A document plus the facet paths it should be indexed under.
#[derive(Debug, Clone, Default)]
pub struct FacetDocument {
    /// The regular fields of the document.
    pub document: TantivyDocument,
    facets: Vec<(String, Vec<String>)>,
}

impl FacetDocument {
    /// Wrap a document without facets.
    pub fn new(document: TantivyDocument) -> Self {
        Self {
            document,
            facets: Vec::new(),
        }
    }

    /// Add the facet `dim/path...`.
    pub fn with_facet<I, S>(mut self, dim: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_facet(dim, path);
        self
    }

    /// Add the facet `dim/path...` in place.
    pub fn add_facet<I, S>(&mut self, dim: impl Into<String>, path: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets
            .push((dim.into(), path.into_iter().map(Into::into).collect()));
    }

    /// The facets added so far, as `(dim, path)` pairs.
    pub fn facets(&self) -> &[(String, Vec<String>)] {
        &self.facets
    }
}

/// Turns a [`FacetDocument`] into an indexable document.
pub trait FacetsConfigExt {
    /// Check every facet against its dimension, resolve taxonomy ordinals
    /// (adding new paths to `taxonomy`), and write both into the document.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFacet`] for an empty path, several values on a
    ///   dimension that is not multi-valued, or a nested path on a dimension
    ///   that is not hierarchical
    /// - [`Error::Engine`] when `schema` lacks the facet fields
    fn build(
        &self,
        schema: &Schema,
        taxonomy: &TaxonomyWriter,
        doc: FacetDocument,
    ) -> Result<TantivyDocument>;
}

impl FacetsConfigExt for FacetsConfig {
    fn build(
        &self,
        schema: &Schema,
        taxonomy: &TaxonomyWriter,
        doc: FacetDocument,
    ) -> Result<TantivyDocument> {
        let FacetDocument {
            mut document,
            facets,
        } = doc;
        if facets.is_empty() {
            return Ok(document);
        }
        let fields = facet_fields(schema)?;

        let mut per_dim: HashMap<&str, usize> = HashMap::new();
        for (dim, path) in &facets {
            if dim.is_empty() {
                return Err(Error::invalid_facet(dim, "dimension name is empty"));
            }
            if path.is_empty() || path.iter().any(String::is_empty) {
                return Err(Error::invalid_facet(dim, "path has an empty component"));
            }

            let dim_config = self.dim_config(dim);
            if path.len() > 1 && !dim_config.hierarchical {
                return Err(Error::invalid_facet(
                    dim,
                    format!("dimension is not hierarchical but got path {path:?}"),
                ));
            }
            let seen = per_dim.entry(dim.as_str()).or_default();
            *seen += 1;
            if *seen > 1 && !dim_config.multi_valued {
                return Err(Error::invalid_facet(
                    dim,
                    "dimension is not multi-valued but has more than one value",
                ));
            }
        }

        for (dim, path) in &facets {
            let facet = dim_path_facet(dim, path);
            let ordinal = taxonomy.add_category(&facet)?;
            document.add_facet(fields.facets, facet);
            document.add_u64(fields.ordinals, ordinal);
        }
        Ok(document)
    }
}

// ============================================================================
// Counting
// ============================================================================

/// One child of a counted facet path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAndValue {
    /// Last path component of the child.
    pub label: String,
    /// Number of matching documents under the child.
    pub value: u64,
    /// Taxonomy ordinal of the child; `None` if the taxonomy snapshot
    /// predates it.
    pub ordinal: Option<u64>,
}

/// Counts for the children of one facet path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetResult {
    /// Dimension name.
    pub dim: String,
    /// Path below the dimension (empty for the dimension itself).
    pub path: Vec<String>,
    /// Number of matching documents under `dim/path`.
    pub value: u64,
    /// Number of distinct children with at least one matching document.
    pub child_count: usize,
    /// Top children, highest count first, ties by label.
    pub label_values: Vec<LabelAndValue>,
}

impl fmt::Display for FacetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "dim={} path={:?} value={} childCount={}",
            self.dim, self.path, self.value, self.child_count
        )?;
        for lv in &self.label_values {
            writeln!(f, "  {} ({})", lv.label, lv.value)?;
        }
        Ok(())
    }
}

/// Facet counts for the documents matching one query.
///
/// Counts are computed per request from the searcher's snapshot; ordinals
/// come from the taxonomy snapshot.
pub struct TaxonomyFacetCounts<'a> {
    searcher: &'a IndexSearcher,
    query: &'a dyn Query,
    taxonomy: &'a TaxonomyReader,
    field: Field,
}

impl<'a> TaxonomyFacetCounts<'a> {
    /// Prepare counting over the documents matching `query`.
    pub fn new(
        searcher: &'a IndexSearcher,
        query: &'a dyn Query,
        taxonomy: &'a TaxonomyReader,
    ) -> Result<Self> {
        let field = facet_fields(searcher.schema())?.facets;
        Ok(Self {
            searcher,
            query,
            taxonomy,
            field,
        })
    }

    /// Number of matching documents under `dim/path`.
    pub fn specific_value<S: AsRef<str>>(&self, dim: &str, path: &[S]) -> Result<u64> {
        let facet = dim_path_facet(dim, path);
        self.count_under(&facet)
    }

    /// The `top_n` children of `dim/path` by count.
    ///
    /// Returns `None` when the path is unknown to the taxonomy or no
    /// matching document falls under it.
    pub fn top_children<S: AsRef<str>>(
        &self,
        top_n: usize,
        dim: &str,
        path: &[S],
    ) -> Result<Option<FacetResult>> {
        let facet = dim_path_facet(dim, path);
        if self.taxonomy.get_ordinal(&facet).is_none() {
            return Ok(None);
        }

        let mut collector = FacetCollector::for_field(FACETS_FIELD);
        collector.add_facet(facet.clone());
        let counts = self.searcher.search(self.query, &collector)?;

        let mut children: Vec<LabelAndValue> = counts
            .get(facet.clone())
            .map(|(child, count)| LabelAndValue {
                label: child
                    .to_path()
                    .last()
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                value: count,
                ordinal: self.taxonomy.get_ordinal(child),
            })
            .collect();
        if children.is_empty() {
            return Ok(None);
        }

        children.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        let child_count = children.len();
        children.truncate(top_n);

        Ok(Some(FacetResult {
            dim: dim.to_string(),
            path: path.iter().map(|s| s.as_ref().to_string()).collect(),
            value: self.count_under(&facet)?,
            child_count,
            label_values: children,
        }))
    }

    /// Top children of every dimension in the taxonomy, in taxonomy order.
    pub fn all_dims(&self, top_n: usize) -> Result<Vec<FacetResult>> {
        let mut results = Vec::new();
        for dim in self.taxonomy.dims() {
            if let Some(result) = self.top_children::<&str>(top_n, &dim, &[])? {
                results.push(result);
            }
        }
        Ok(results)
    }

    fn count_under(&self, facet: &Facet) -> Result<u64> {
        let term = TermQuery::new(
            Term::from_facet(self.field, facet),
            IndexRecordOption::Basic,
        );
        let query = BooleanQuery::new(vec![
            (Occur::Must, self.query.box_clone()),
            (Occur::Must, Box::new(term)),
        ]);
        Ok(self.searcher.count(&query)? as u64)
    }
}

impl fmt::Debug for TaxonomyFacetCounts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxonomyFacetCounts")
            .field("searcher", self.searcher)
            .field("taxonomy", self.taxonomy)
            .finish()
    }
}

// ============================================================================
// Drill-down
// ============================================================================

/// Narrows a base query to documents under given facet paths.
///
/// Paths within one dimension are alternatives; separate dimensions must all
/// match.
#[derive(Debug)]
pub struct DrillDownQuery {
    base: Option<Box<dyn Query>>,
    dims: Vec<(String, Vec<Facet>)>,
}

impl DrillDownQuery {
    /// Drill down over all documents.
    pub fn new() -> Self {
        Self {
            base: None,
            dims: Vec::new(),
        }
    }

    /// Drill down within the results of `base`.
    pub fn with_base(base: Box<dyn Query>) -> Self {
        Self {
            base: Some(base),
            dims: Vec::new(),
        }
    }

    /// Require `dim/path...`, or-ed with earlier paths of the same `dim`.
    pub fn add<S: AsRef<str>>(mut self, dim: &str, path: &[S]) -> Self {
        let facet = dim_path_facet(dim, path);
        match self.dims.iter_mut().find(|(name, _)| name == dim) {
            Some((_, facets)) => facets.push(facet),
            None => self.dims.push((dim.to_string(), vec![facet])),
        }
        self
    }

    /// Number of dimensions drilled into.
    pub fn dim_count(&self) -> usize {
        self.dims.len()
    }

    /// Build the executable query against `schema`.
    pub fn to_query(&self, schema: &Schema) -> Result<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        if let Some(base) = &self.base {
            clauses.push((Occur::Must, base.box_clone()));
        }

        if !self.dims.is_empty() {
            let field = facet_fields(schema)?.facets;
            for (_, facets) in &self.dims {
                let mut alternatives: Vec<(Occur, Box<dyn Query>)> = facets
                    .iter()
                    .map(|facet| {
                        let term = TermQuery::new(
                            Term::from_facet(field, facet),
                            IndexRecordOption::Basic,
                        );
                        (Occur::Should, Box::new(term) as Box<dyn Query>)
                    })
                    .collect();
                let clause: Box<dyn Query> = if alternatives.len() == 1 {
                    alternatives.remove(0).1
                } else {
                    Box::new(BooleanQuery::new(alternatives))
                };
                clauses.push((Occur::Must, clause));
            }
        }

        Ok(match clauses.len() {
            0 => Box::new(AllQuery),
            1 => clauses.remove(0).1,
            _ => Box::new(BooleanQuery::new(clauses)),
        })
    }
}

impl Default for DrillDownQuery {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::factory::{build_reader, build_searcher, build_writer};
    use crate::resources::IndexWriter;
    use crate::schema::{BODY_FIELD, ID_FIELD};
    use lucent_core::{
        DefaultIndexConfigurator, EmptyReaderPolicy, IndexConfiguration, IndexKey,
        StorageLocation,
    };

    struct Fixture {
        config: FacetsConfig,
        writer: IndexWriter,
        taxonomy: TaxonomyWriter,
        facets_storage: StorageLocation,
    }

    fn fixture(config: FacetsConfig) -> Fixture {
        let facets_storage = StorageLocation::in_memory();
        let mut index_config =
            IndexConfiguration::new().with_facets_storage(facets_storage.clone());
        DefaultIndexConfigurator.configure(&mut index_config);

        let writer = build_writer(&IndexKey::DEFAULT, &index_config).unwrap();
        let taxonomy = TaxonomyWriter::open(IndexKey::DEFAULT, &facets_storage).unwrap();
        Fixture {
            config,
            writer,
            taxonomy,
            facets_storage,
        }
    }

    impl Fixture {
        fn add(&self, id: &str, facets: &[(&str, &[&str])]) -> Result<()> {
            let mut doc = TantivyDocument::new();
            doc.add_text(self.writer.field(ID_FIELD).unwrap(), id);
            doc.add_text(self.writer.field(BODY_FIELD).unwrap(), "product");
            let mut doc = FacetDocument::new(doc);
            for (dim, path) in facets {
                doc.add_facet(*dim, path.iter().copied());
            }
            let doc = self.config.build(self.writer.schema(), &self.taxonomy, doc)?;
            self.writer.add_document(doc)?;
            Ok(())
        }

        fn commit(&self) {
            self.taxonomy.commit().unwrap();
            self.writer.commit().unwrap();
        }
    }

    fn products() -> Fixture {
        let mut config = FacetsConfig::new();
        config.set_multi_valued("tags", true);
        let f = fixture(config);
        f.add(
            "1",
            &[
                ("category", &["Electronics"]),
                ("tags", &["sale"]),
                ("tags", &["new"]),
            ],
        )
        .unwrap();
        f.add("2", &[("category", &["Electronics"])]).unwrap();
        f.add("3", &[("category", &["Sports"]), ("tags", &["sale"])])
            .unwrap();
        f.add("4", &[("category", &["Furniture"])]).unwrap();
        f.add("5", &[("category", &["Sports"])]).unwrap();
        f.commit();
        f
    }

    #[test]
    fn test_build_writes_facet_and_ordinal() {
        let f = fixture(FacetsConfig::new());
        let mut doc = TantivyDocument::new();
        doc.add_text(f.writer.field(ID_FIELD).unwrap(), "1");
        let doc = FacetDocument::new(doc).with_facet("category", ["Electronics"]);

        let built = f.config.build(f.writer.schema(), &f.taxonomy, doc).unwrap();
        let fields = FacetFields::from_schema(f.writer.schema()).unwrap();
        assert_eq!(built.get_all(fields.facets).count(), 1);
        assert_eq!(built.get_all(fields.ordinals).count(), 1);
        assert!(f.taxonomy.get_ordinal(&Facet::from("/category/Electronics")).is_some());
    }

    #[test]
    fn test_build_rejects_multiple_values_on_single_valued_dim() {
        let f = fixture(FacetsConfig::new());
        let err = f
            .add("1", &[("category", &["Electronics"]), ("category", &["Sports"])])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFacet { dim, .. } if dim == "category"));
    }

    #[test]
    fn test_build_rejects_nested_path_on_flat_dim() {
        let f = fixture(FacetsConfig::new());
        let err = f.add("1", &[("category", &["Electronics", "Phones"])]).unwrap_err();
        assert!(matches!(err, Error::InvalidFacet { .. }));
    }

    #[test]
    fn test_build_accepts_separate_values_on_multi_valued_dim() {
        let mut config = FacetsConfig::new();
        config.set_multi_valued("tags", true);
        let f = fixture(config);
        f.add("1", &[("tags", &["sale"]), ("tags", &["new"])]).unwrap();
        assert!(f.taxonomy.get_ordinal(&Facet::from("/tags/sale")).is_some());
        assert!(f.taxonomy.get_ordinal(&Facet::from("/tags/new")).is_some());

        let err = f.add("2", &[("tags", &["sale", "new"])]).unwrap_err();
        assert!(matches!(err, Error::InvalidFacet { dim, .. } if dim == "tags"));
    }

    #[test]
    fn test_build_accepts_hierarchical_path() {
        let mut config = FacetsConfig::new();
        config.set_hierarchical("publish", true);
        let f = fixture(config);
        f.add("1", &[("publish", &["2024", "10", "15"])]).unwrap();
        assert!(f.taxonomy.get_ordinal(&Facet::from("/publish/2024/10")).is_some());
    }

    #[test]
    fn test_build_without_facet_fields() {
        let mut index_config = IndexConfiguration::new();
        DefaultIndexConfigurator.configure(&mut index_config);
        let writer = build_writer(&IndexKey::DEFAULT, &index_config).unwrap();
        let taxonomy = TaxonomyWriter::open(IndexKey::DEFAULT, &StorageLocation::in_memory()).unwrap();

        let doc = FacetDocument::default().with_facet("category", ["Electronics"]);
        let err = FacetsConfig::new()
            .build(writer.schema(), &taxonomy, doc)
            .unwrap_err();
        assert!(matches!(err, Error::Engine(TantivyError::SchemaError(_))));
    }

    #[test]
    fn test_top_children_counts() {
        let f = products();
        let reader = build_reader(&f.writer, EmptyReaderPolicy::Allow).unwrap();
        let searcher = build_searcher(&reader).unwrap();
        let taxonomy =
            TaxonomyReader::open(IndexKey::DEFAULT, &f.facets_storage, EmptyReaderPolicy::Allow)
                .unwrap();

        let counts = TaxonomyFacetCounts::new(&searcher, &AllQuery, &taxonomy).unwrap();
        let result = counts.top_children::<&str>(10, "category", &[]).unwrap().unwrap();
        assert_eq!(result.value, 5);
        assert_eq!(result.child_count, 3);
        let labels: Vec<(&str, u64)> = result
            .label_values
            .iter()
            .map(|lv| (lv.label.as_str(), lv.value))
            .collect();
        assert_eq!(
            labels,
            vec![("Electronics", 2), ("Sports", 2), ("Furniture", 1)]
        );
        assert!(result.label_values.iter().all(|lv| lv.ordinal.is_some()));
    }

    #[test]
    fn test_multi_valued_dim_counts_documents() {
        let f = products();
        let reader = build_reader(&f.writer, EmptyReaderPolicy::Allow).unwrap();
        let searcher = build_searcher(&reader).unwrap();
        let taxonomy =
            TaxonomyReader::open(IndexKey::DEFAULT, &f.facets_storage, EmptyReaderPolicy::Allow)
                .unwrap();

        let counts = TaxonomyFacetCounts::new(&searcher, &AllQuery, &taxonomy).unwrap();
        let tags = counts.top_children::<&str>(10, "tags", &[]).unwrap().unwrap();
        assert_eq!(tags.value, 2);
        assert_eq!(counts.specific_value("tags", &["sale"]).unwrap(), 2);
        assert_eq!(counts.all_dims(10).unwrap().len(), 2);
    }

    #[test]
    fn test_top_children_unknown_dim() {
        let f = products();
        let reader = build_reader(&f.writer, EmptyReaderPolicy::Allow).unwrap();
        let searcher = build_searcher(&reader).unwrap();
        let taxonomy =
            TaxonomyReader::open(IndexKey::DEFAULT, &f.facets_storage, EmptyReaderPolicy::Allow)
                .unwrap();

        let counts = TaxonomyFacetCounts::new(&searcher, &AllQuery, &taxonomy).unwrap();
        assert!(counts.top_children::<&str>(10, "brand", &[]).unwrap().is_none());
    }

    #[test]
    fn test_drill_down_restricts_hits_and_counts() {
        let f = products();
        let reader = build_reader(&f.writer, EmptyReaderPolicy::Allow).unwrap();
        let searcher = build_searcher(&reader).unwrap();
        let taxonomy =
            TaxonomyReader::open(IndexKey::DEFAULT, &f.facets_storage, EmptyReaderPolicy::Allow)
                .unwrap();

        let query = DrillDownQuery::new()
            .add("category", &["Electronics"])
            .to_query(searcher.schema())
            .unwrap();
        assert_eq!(searcher.count(query.as_ref()).unwrap(), 2);

        let counts = TaxonomyFacetCounts::new(&searcher, query.as_ref(), &taxonomy).unwrap();
        let tags = counts.top_children::<&str>(10, "tags", &[]).unwrap().unwrap();
        assert_eq!(tags.value, 1);
        assert_eq!(tags.label_values.len(), 2);
    }

    #[test]
    fn test_drill_down_same_dim_is_or() {
        let f = products();
        let reader = build_reader(&f.writer, EmptyReaderPolicy::Allow).unwrap();
        let searcher = build_searcher(&reader).unwrap();

        let query = DrillDownQuery::new()
            .add("category", &["Electronics"])
            .add("category", &["Furniture"])
            .to_query(searcher.schema())
            .unwrap();
        assert_eq!(searcher.count(query.as_ref()).unwrap(), 3);

        let query = DrillDownQuery::new()
            .add("category", &["Sports"])
            .add("tags", &["sale"])
            .to_query(searcher.schema())
            .unwrap();
        assert_eq!(searcher.count(query.as_ref()).unwrap(), 1);
    }

    #[test]
    fn test_drill_down_with_base_query() {
        let f = products();
        let reader = build_reader(&f.writer, EmptyReaderPolicy::Allow).unwrap();
        let searcher = build_searcher(&reader).unwrap();

        let base = searcher.parse_query("id:1 OR id:3").unwrap();
        let query = DrillDownQuery::with_base(base)
            .add("tags", &["sale"])
            .to_query(searcher.schema())
            .unwrap();
        assert_eq!(searcher.count(query.as_ref()).unwrap(), 2);
        assert_eq!(DrillDownQuery::new().dim_count(), 0);
    }
}
