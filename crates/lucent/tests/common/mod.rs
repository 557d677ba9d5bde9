//! Common helpers for lucent integration tests.

use lucent::{IndexConfiguration, IndexWriter};
use tantivy::TantivyDocument;
use tantivy::schema::{STORED, STRING, Schema, SchemaBuilder, TEXT};

/// Schema with a string `id` and a full-text `name`.
pub fn named_schema() -> Schema {
    let mut builder = SchemaBuilder::new();
    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("name", TEXT | STORED);
    builder.build()
}

/// Override that installs [`named_schema`].
pub fn use_named_schema(config: &mut IndexConfiguration) {
    config.schema = Some(named_schema());
}

/// A document for [`named_schema`].
pub fn named_doc(writer: &IndexWriter, id: &str, name: &str) -> TantivyDocument {
    let mut doc = TantivyDocument::new();
    doc.add_text(writer.field("id").unwrap(), id);
    doc.add_text(writer.field("name").unwrap(), name);
    doc
}

/// Add documents and commit.
pub fn index_names(writer: &IndexWriter, names: &[&str]) {
    for (i, name) in names.iter().enumerate() {
        writer
            .add_document(named_doc(writer, &i.to_string(), name))
            .unwrap();
    }
    writer.commit().unwrap();
}
