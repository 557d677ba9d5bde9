//! Text analyzers.
//!
//! An [`Analyzer`] wraps a tantivy [`TextAnalyzer`] under a name. The analyzer
//! configured for an index is registered as that index's `default` tokenizer,
//! so every text field built with tantivy's `TEXT` option goes through it, at
//! indexing and at query parsing time.

use std::fmt;

use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream,
};

use crate::config::SchemaVersion;

/// Tokens longer than this many bytes are dropped by the standard analyzers.
pub const MAX_TOKEN_LENGTH: usize = 40;

/// A named tokenization/analysis strategy.
#[derive(Clone)]
pub struct Analyzer {
    name: String,
    analyzer: TextAnalyzer,
}

impl Analyzer {
    /// Wrap a custom tantivy analyzer.
    pub fn new(name: impl Into<String>, analyzer: TextAnalyzer) -> Self {
        Self {
            name: name.into(),
            analyzer,
        }
    }

    /// The standard analyzer for a schema version.
    ///
    /// - [`SchemaVersion::V1`]: SimpleTokenizer → RemoveLong(40) → LowerCaser
    /// - [`SchemaVersion::V2`]: V1 → Stemmer(English)
    pub fn standard(version: SchemaVersion) -> Self {
        let analyzer = match version {
            SchemaVersion::V1 => TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
                .filter(LowerCaser)
                .build(),
            SchemaVersion::V2 => TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
                .filter(LowerCaser)
                .filter(Stemmer::new(Language::English))
                .build(),
        };
        Self::new(format!("standard-{version}"), analyzer)
    }

    /// The analyzer's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A clone of the underlying tantivy analyzer.
    pub fn text_analyzer(&self) -> TextAnalyzer {
        self.analyzer.clone()
    }

    /// Run the analyzer over `text` and collect the produced terms.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        tokens
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").field("name", &self.name).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
