//! Resolution scopes.
//!
//! A scope caches one [`ResourceBundle`] per resolved key and releases them
//! all when it ends, most recently resolved first.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lucent_core::IndexKey;

use crate::bundle::ResourceBundle;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Owner of the bundles resolved within one unit of work.
#[derive(Debug)]
pub struct IndexScope {
    id: u64,
    bundles: Vec<(IndexKey, Arc<ResourceBundle>)>,
}

impl IndexScope {
    /// Start an empty scope.
    pub fn new() -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Opened index scope {id}");
        Self {
            id,
            bundles: Vec::new(),
        }
    }

    /// Process-unique scope identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The bundle resolved for `key`, if any.
    pub fn get(&self, key: &IndexKey) -> Option<&Arc<ResourceBundle>> {
        self.bundles
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, bundle)| bundle)
    }

    pub(crate) fn insert(&mut self, key: IndexKey, bundle: Arc<ResourceBundle>) {
        self.bundles.push((key, bundle));
    }

    /// Resolved keys, in resolution order.
    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.bundles.iter().map(|(key, _)| key)
    }

    /// Number of resolved bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Returns `true` if nothing was resolved in this scope.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// End the scope now.
    pub fn end(self) {}
}

impl Default for IndexScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndexScope {
    fn drop(&mut self) {
        log::debug!("Closing index scope {} ({} bundles)", self.id, self.bundles.len());
        while let Some((key, bundle)) = self.bundles.pop() {
            if Arc::strong_count(&bundle) > 1 {
                log::debug!("Bundle for index '{key}' outlives scope {}", self.id);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
