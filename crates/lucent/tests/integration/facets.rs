//! End-to-end facet indexing, counting and drill-down.

use lucent::{
    DrillDownQuery, Error, FacetDocument, FacetsConfig, FacetsConfigExt, IndexRegistry,
    ResourceBundle, StorageLocation, TaxonomyFacetCounts,
};
use tantivy::TantivyDocument;
use tantivy::collector::DocSetCollector;
use tantivy::query::AllQuery;
use tantivy::schema::{STORED, STRING, SchemaBuilder, Value};

const PRODUCTS: [(&str, &str, &str, u64); 5] = [
    ("MacBook Pro", "Electronics", "Apple", 2499),
    ("iPhone 15", "Electronics", "Apple", 999),
    ("Coffee Maker", "Home & Kitchen", "Breville", 299),
    ("Desk Chair", "Home & Kitchen", "Herman Miller", 1299),
    ("Running Shoes", "Sports", "Nike", 120),
];

fn product_registry() -> IndexRegistry {
    let registry = IndexRegistry::new();
    registry
        .add_named_index("products", |config| {
            let mut builder = SchemaBuilder::new();
            builder.add_text_field("name", STRING | STORED);
            builder.add_u64_field("price", STORED);
            config.schema = Some(builder.build());
            config.facets_storage = Some(StorageLocation::in_memory());
            let mut facets = FacetsConfig::new();
            facets.set_multi_valued("category", false);
            config.facets_config = Some(facets);
        })
        .unwrap();
    registry
}

fn index_products(bundle: &ResourceBundle) {
    let writer = bundle.writer();
    let taxonomy = bundle.taxonomy_writer().unwrap();
    let facets_config = bundle.configuration().facets_config_or_default();

    for (name, category, brand, price) in PRODUCTS {
        let mut doc = TantivyDocument::new();
        doc.add_text(writer.field("name").unwrap(), name);
        doc.add_u64(writer.field("price").unwrap(), price);
        let doc = FacetDocument::new(doc)
            .with_facet("category", [category])
            .with_facet("brand", [brand]);

        let built = facets_config.build(writer.schema(), &taxonomy, doc).unwrap();
        writer.add_document(built).unwrap();
    }

    writer.commit().unwrap();
    taxonomy.commit().unwrap();
}

#[test]
fn test_taxonomy_requires_facets_storage() {
    let registry = IndexRegistry::new();
    registry.add_index(|_| {}).unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("", &mut scope).unwrap();
    assert!(matches!(
        bundle.taxonomy_writer().unwrap_err(),
        Error::FacetsNotConfigured { .. }
    ));
    assert!(matches!(
        bundle.taxonomy_reader().unwrap_err(),
        Error::FacetsNotConfigured { .. }
    ));
    // The writer is unaffected.
    assert!(bundle.reader().is_ok());
}

#[test]
fn test_category_counts_sum_to_document_count() {
    let registry = product_registry();
    let mut scope = registry.create_scope();
    let bundle = registry.resolve("products", &mut scope).unwrap();
    let facets_config = bundle.configuration().facets_config_or_default();
    assert!(facets_config.is_declared("category"));
    assert!(!facets_config.dim_config("category").multi_valued);
    index_products(&bundle);

    let searcher = bundle.searcher().unwrap();
    let taxonomy = bundle.taxonomy_reader().unwrap();
    let counts = TaxonomyFacetCounts::new(&searcher, &AllQuery, &taxonomy).unwrap();

    let categories = counts
        .top_children::<&str>(10, "category", &[])
        .unwrap()
        .unwrap();
    assert_eq!(categories.child_count, 3);
    assert_eq!(
        categories.label_values.iter().map(|lv| lv.value).sum::<u64>(),
        5
    );
    assert_eq!(categories.value, 5);
    assert_eq!(categories.label_values[0].label, "Electronics");

    let brands = counts.top_children::<&str>(2, "brand", &[]).unwrap().unwrap();
    assert_eq!(brands.child_count, 4);
    assert_eq!(brands.label_values.len(), 2);
    assert_eq!(brands.label_values[0].label, "Apple");
    assert_eq!(brands.label_values[0].value, 2);
}

#[test]
fn test_drill_down_on_electronics() {
    let registry = product_registry();
    let mut scope = registry.create_scope();
    let bundle = registry.resolve("products", &mut scope).unwrap();
    index_products(&bundle);

    let searcher = bundle.searcher().unwrap();
    let taxonomy = bundle.taxonomy_reader().unwrap();
    let query = DrillDownQuery::new()
        .add("category", &["Electronics"])
        .to_query(searcher.schema())
        .unwrap();

    let hits = searcher.search(query.as_ref(), &DocSetCollector).unwrap();
    let name = searcher.schema().get_field("name").unwrap();
    let mut names: Vec<String> = hits
        .into_iter()
        .map(|address| {
            let doc = searcher.doc(address).unwrap();
            doc.get_first(name)
                .and_then(|v| v.as_str())
                .unwrap()
                .to_string()
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["MacBook Pro", "iPhone 15"]);

    let counts = TaxonomyFacetCounts::new(&searcher, query.as_ref(), &taxonomy).unwrap();
    let brands = counts.top_children::<&str>(10, "brand", &[]).unwrap().unwrap();
    assert_eq!(brands.child_count, 1);
    assert_eq!(brands.label_values[0].label, "Apple");
    assert_eq!(brands.label_values[0].value, 2);
}

#[test]
fn test_taxonomy_reader_after_commit_only() {
    let registry = IndexRegistry::new();
    registry
        .add_named_index("test", |config| {
            config.facets_storage = Some(StorageLocation::in_memory());
        })
        .unwrap();

    let mut scope = registry.create_scope();
    let bundle = registry.resolve("test", &mut scope).unwrap();
    bundle.taxonomy_writer().unwrap().commit().unwrap();

    let taxonomy = bundle.taxonomy_reader().unwrap();
    assert_eq!(taxonomy.size(), 1);
    assert_eq!(taxonomy.key().as_str(), "test");
}
