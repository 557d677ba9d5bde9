//! Index keys.
//!
//! Every registration lives under an [`IndexKey`]. The unnamed index is not a
//! special case: it is the reserved key whose name is empty, so named and
//! unnamed registrations share one code path end to end. The name
//! [`DEFAULT_INDEX_NAME`] is an alias for it, in code and in settings files
//! alike.

use std::fmt;

/// Name that maps to the unnamed index.
pub const DEFAULT_INDEX_NAME: &str = "default";

/// Identifier of one registered index.
///
/// ```rust
/// use lucent_core::IndexKey;
///
/// assert_eq!(IndexKey::from(""), IndexKey::DEFAULT);
/// assert_eq!(IndexKey::from("default"), IndexKey::DEFAULT);
/// assert!(IndexKey::named("products").is_named());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexKey(String);

impl IndexKey {
    /// The reserved key of the unnamed index.
    pub const DEFAULT: IndexKey = IndexKey(String::new());

    /// Create a key for a named index.
    ///
    /// An empty name and [`DEFAULT_INDEX_NAME`] both yield
    /// [`IndexKey::DEFAULT`].
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == DEFAULT_INDEX_NAME {
            Self::DEFAULT
        } else {
            Self(name)
        }
    }

    /// The raw name; empty for the default key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the reserved default key.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` for any key other than the default one.
    pub fn is_named(&self) -> bool {
        !self.is_default()
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "<default>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for IndexKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for IndexKey {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&String> for IndexKey {
    fn from(name: &String) -> Self {
        Self::named(name.as_str())
    }
}

impl From<&IndexKey> for IndexKey {
    fn from(key: &IndexKey) -> Self {
        key.clone()
    }
}

impl From<Option<&str>> for IndexKey {
    fn from(name: Option<&str>) -> Self {
        name.map(Self::named).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
