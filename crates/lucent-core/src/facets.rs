//! Facet dimension configuration.
//!
//! [`FacetsConfig`] declares how each facet dimension behaves. Dimensions that
//! are not declared use [`DimConfig::default`]: single-valued and flat.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Behaviour of a single facet dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DimConfig {
    /// A document may carry several values for this dimension.
    #[serde(default)]
    pub multi_valued: bool,
    /// Values are paths (`category/laptops/ultrabooks`) rather than labels.
    #[serde(default)]
    pub hierarchical: bool,
}

/// Per-dimension facet configuration.
///
/// ```rust
/// use lucent_core::FacetsConfig;
///
/// let mut facets = FacetsConfig::new();
/// facets.set_multi_valued("tags", true);
/// assert!(facets.dim_config("tags").multi_valued);
/// assert!(!facets.dim_config("category").multi_valued);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetsConfig {
    dims: BTreeMap<String, DimConfig>,
}

impl FacetsConfig {
    /// An empty configuration: every dimension single-valued and flat.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare whether `dim` accepts several values per document.
    pub fn set_multi_valued(&mut self, dim: impl Into<String>, multi_valued: bool) -> &mut Self {
        self.dims.entry(dim.into()).or_default().multi_valued = multi_valued;
        self
    }

    /// Declare whether `dim` takes hierarchical paths.
    pub fn set_hierarchical(&mut self, dim: impl Into<String>, hierarchical: bool) -> &mut Self {
        self.dims.entry(dim.into()).or_default().hierarchical = hierarchical;
        self
    }

    /// Replace the whole configuration of `dim`.
    pub fn set_dim_config(&mut self, dim: impl Into<String>, config: DimConfig) -> &mut Self {
        self.dims.insert(dim.into(), config);
        self
    }

    /// The configuration of `dim`, or the default if it was never declared.
    pub fn dim_config(&self, dim: &str) -> DimConfig {
        self.dims.get(dim).copied().unwrap_or_default()
    }

    /// Whether `dim` was explicitly declared.
    pub fn is_declared(&self, dim: &str) -> bool {
        self.dims.contains_key(dim)
    }

    /// Declared dimensions, in name order.
    pub fn dims(&self) -> impl Iterator<Item = (&str, &DimConfig)> {
        self.dims.iter().map(|(name, config)| (name.as_str(), config))
    }
}

// ============================================================================
// Tests
// ============================================================================
