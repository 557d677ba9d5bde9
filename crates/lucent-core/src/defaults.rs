//! Default values for unset configuration fields.
//!
//! The defaults aim at local development: an in-memory store and the standard
//! analyzer for the configured version. Deployments will want to override
//! `storage` with a persistent location.

use crate::analyzer::Analyzer;
use crate::config::IndexConfiguration;
use crate::storage::StorageLocation;

/// Fills holes in an [`IndexConfiguration`] without touching explicit values.
///
/// Applying the configurator more than once is equivalent to applying it once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIndexConfigurator;

impl DefaultIndexConfigurator {
    /// Fill `analyzer` and `storage` if they are unset.
    pub fn configure(&self, config: &mut IndexConfiguration) {
        if config.analyzer.is_none() {
            config.analyzer = Some(Analyzer::standard(config.version));
        }
        if config.storage.is_none() {
            config.storage = Some(StorageLocation::in_memory());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
