//! Configuration validation.
//!
//! Validation runs after defaults and overrides and before any resource is
//! built. It reports **every** missing required field in one error rather
//! than stopping at the first.

use crate::config::{ConfigField, IndexConfiguration};
use crate::error::{Error, Result};
use crate::key::IndexKey;

/// Non-fatal findings of a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Human-readable warnings; already logged.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` when validation found nothing to report.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Checks required fields of an [`IndexConfiguration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexConfigurationValidator;

impl IndexConfigurationValidator {
    /// Validate `config` for the index `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigurationInvalid`] listing every field of
    ///   [`ConfigField::REQUIRED`] that is unset
    /// - [`Error::Config`] when explicit writer settings pin zero threads
    pub fn validate(&self, key: &IndexKey, config: &IndexConfiguration) -> Result<ValidationReport> {
        let missing_fields: Vec<ConfigField> = ConfigField::REQUIRED
            .into_iter()
            .filter(|field| !field.is_set(config))
            .collect();

        if !missing_fields.is_empty() {
            log::debug!("Index '{key}' failed validation: missing {missing_fields:?}");
            return Err(Error::ConfigurationInvalid {
                key: key.clone(),
                missing_fields,
            });
        }

        if let Some(settings) = &config.writer_settings
            && settings.num_threads == Some(0)
        {
            log::debug!("Index '{key}' failed validation: zero writer threads");
            return Err(Error::config(format!(
                "index '{key}': writer thread count must be at least 1"
            )));
        }

        let mut report = ValidationReport::default();

        if config.facets_config.is_some() && config.facets_storage.is_none() {
            report.warnings.push(
                "facets_config is set but facets_storage is not; facet components are unavailable"
                    .to_string(),
            );
        }

        if let Some(settings) = &config.writer_settings
            && settings.version != config.version
        {
            report.warnings.push(format!(
                "writer_settings were derived for {} but the index is configured for {}",
                settings.version, config.version
            ));
        }

        for warning in &report.warnings {
            log::warn!("Index '{key}': {warning}");
        }

        Ok(report)
    }
}

// ============================================================================
// Tests
// ============================================================================
