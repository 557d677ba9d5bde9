//! Document schemas for newly created indexes.
//!
//! tantivy needs a schema when an index is first created; an existing index
//! always keeps the schema it was created with. When a configuration names no
//! schema, [`default_schema`] is used:
//!
//! - `id`: unique document identifier (STRING | STORED)
//! - `body`: main content (TEXT | STORED, analyzed by the index analyzer)
//!
//! Indexes with facets storage get two extra fields, appended by
//! [`effective_schema`]:
//!
//! - `_facets`: the document's facet paths (facet field, stored)
//! - `_facet_ordinals`: taxonomy ordinals of those paths (u64, INDEXED | STORED | FAST)

use lucent_core::IndexConfiguration;
use tantivy::schema::{
    FAST, FacetOptions, Field, INDEXED, STORED, STRING, Schema, SchemaBuilder, TEXT,
};

/// Identifier field of the default schema.
pub const ID_FIELD: &str = "id";

/// Content field of the default schema.
pub const BODY_FIELD: &str = "body";

/// Facet paths of a document.
pub const FACETS_FIELD: &str = "_facets";

/// Taxonomy ordinals of a document's facet paths.
pub const FACET_ORDINALS_FIELD: &str = "_facet_ordinals";

/// Build the default two-field schema.
pub fn default_schema() -> Schema {
    let mut builder = SchemaBuilder::new();
    builder.add_text_field(ID_FIELD, STRING | STORED);
    builder.add_text_field(BODY_FIELD, TEXT | STORED);
    builder.build()
}

/// The schema a new index for `config` is created with.
///
/// The configured schema (or [`default_schema`]), plus the facet fields when
/// `facets_storage` is set and the schema does not declare them yet.
pub fn effective_schema(config: &IndexConfiguration) -> Schema {
    let base = config.schema.clone().unwrap_or_else(default_schema);

    if !config.has_facets() || FacetFields::from_schema(&base).is_some() {
        return base;
    }

    let mut builder = SchemaBuilder::new();
    for (_, entry) in base.fields() {
        builder.add_field(entry.clone());
    }
    add_facet_fields(&mut builder);
    builder.build()
}

/// Declare the facet fields on a schema under construction.
///
/// Use this when building a custom schema for an index with facets; the
/// registry appends them automatically otherwise.
pub fn add_facet_fields(builder: &mut SchemaBuilder) -> FacetFields {
    let facets = builder.add_facet_field(FACETS_FIELD, FacetOptions::default().set_stored());
    let ordinals = builder.add_u64_field(FACET_ORDINALS_FIELD, INDEXED | STORED | FAST);
    FacetFields { facets, ordinals }
}

/// Handles of the facet fields in a concrete schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetFields {
    /// [`FACETS_FIELD`].
    pub facets: Field,
    /// [`FACET_ORDINALS_FIELD`].
    pub ordinals: Field,
}

impl FacetFields {
    /// Look up the facet fields; `None` if the schema lacks either of them.
    pub fn from_schema(schema: &Schema) -> Option<Self> {
        let facets = schema.get_field(FACETS_FIELD).ok()?;
        let ordinals = schema.get_field(FACET_ORDINALS_FIELD).ok()?;
        Some(Self { facets, ordinals })
    }
}

// ============================================================================
// Tests
// ============================================================================
