//! Error types for Lucent.

use std::path::{Path, PathBuf};

use crate::config::ConfigField;
use crate::key::IndexKey;

/// Result type alias for Lucent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while registering, resolving, or using index resources.
///
/// All variants are reported at the call site that triggered them; nothing is
/// retried internally.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// One or more required configuration fields are missing after defaults
    /// and overrides were applied.
    #[error("Configuration for index '{key}' is invalid: missing {}", join_fields(.missing_fields))]
    ConfigurationInvalid {
        /// Index whose configuration failed validation.
        key: IndexKey,
        /// Every missing required field, in declaration order.
        missing_fields: Vec<ConfigField>,
    },

    /// The index was never registered.
    #[error("Unknown index: '{key}'")]
    UnknownIndex {
        /// The requested key.
        key: IndexKey,
    },

    /// The index already resolved successfully and no longer accepts overrides.
    #[error("Index '{key}' has already been resolved; its registration is closed")]
    RegistrationClosed {
        /// The frozen key.
        key: IndexKey,
    },

    /// The storage location could not be opened, created, or locked for writing.
    #[error("Storage unavailable at {location}: {message}")]
    StorageUnavailable {
        /// Human-readable description of the location.
        location: String,
        /// What went wrong.
        message: String,
    },

    /// A taxonomy component was requested but no facets storage is configured.
    #[error("Facets are not configured for index '{key}'")]
    FacetsNotConfigured {
        /// Index without facets storage.
        key: IndexKey,
    },

    /// The engine could not produce a reader under the configured policy.
    #[error("Reader unavailable: {message}")]
    ReaderUnavailable {
        /// What went wrong.
        message: String,
    },

    /// A facet document does not match its dimension configuration.
    #[error("Invalid facet '{dim}': {message}")]
    InvalidFacet {
        /// Offending dimension.
        dim: String,
        /// What went wrong.
        message: String,
    },

    /// Any other failure reported by the search engine.
    #[error("Engine error: {0}")]
    Engine(#[from] tantivy::TantivyError),

    /// I/O error with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error: a malformed settings file or an out-of-range value.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic.
        message: String,
    },
}

fn join_fields(fields: &[ConfigField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Returns whether retrying the same call might succeed.
    ///
    /// Storage, reader, and I/O failures can be transient (a lock held by
    /// another scope, a commit not yet made). Configuration and caller errors
    /// are permanent until the caller changes something.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::StorageUnavailable { .. } => true,
            Error::ReaderUnavailable { .. } => true,
            Error::Io { .. } => true,
            Error::ConfigurationInvalid { .. } => false,
            Error::UnknownIndex { .. } => false,
            Error::RegistrationClosed { .. } => false,
            Error::FacetsNotConfigured { .. } => false,
            Error::InvalidFacet { .. } => false,
            Error::Engine(_) => false,
            Error::Config { .. } => false,
        }
    }

    /// Creates a storage error for the given location.
    pub fn storage<L, M>(location: L, message: M) -> Self
    where
        L: Into<String>,
        M: Into<String>,
    {
        Error::StorageUnavailable {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates a reader error.
    pub fn reader<S: Into<String>>(message: S) -> Self {
        Error::ReaderUnavailable {
            message: message.into(),
        }
    }

    /// Creates an invalid-facet error.
    pub fn invalid_facet<D, M>(dim: D, message: M) -> Self
    where
        D: Into<String>,
        M: Into<String>,
    {
        Error::InvalidFacet {
            dim: dim.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The missing fields of a [`Error::ConfigurationInvalid`], empty otherwise.
    pub fn missing_fields(&self) -> &[ConfigField] {
        match self {
            Error::ConfigurationInvalid { missing_fields, .. } => missing_fields,
            _ => &[],
        }
    }
}
