//! The named index registry.
//!
//! Registrations map an [`IndexKey`] to a base [`IndexConfiguration`] plus an
//! ordered list of override callbacks. Nothing is built at registration time.
//! On the first [`IndexRegistry::resolve`] of a key within a scope the
//! registry:
//!
//! 1. clones the base record,
//! 2. fills holes with the [`DefaultIndexConfigurator`],
//! 3. applies the overrides in registration order,
//! 4. validates the result with the [`IndexConfigurationValidator`],
//! 5. builds the writer and caches the bundle in the scope.
//!
//! Any failure leaves the scope untouched, so a later resolve starts over.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use lucent_core::{
    ConfigurationOverlay, DefaultIndexConfigurator, Error, IndexConfiguration,
    IndexConfigurationValidator, IndexKey, LucentConfig, Result,
};

use crate::bundle::ResourceBundle;
use crate::factory;
use crate::scope::IndexScope;

/// An override applied to a configuration after defaults.
pub type ConfigureFn = Arc<dyn Fn(&mut IndexConfiguration) + Send + Sync>;

#[derive(Default)]
struct Registration {
    base: IndexConfiguration,
    overrides: Vec<ConfigureFn>,
    resolved: bool,
    // Bumped on every change; a resolve only closes the generation it built.
    generation: u64,
}

/// Registry of named index configurations.
///
/// Share it behind an [`Arc`]; registration and resolution both take `&self`.
#[derive(Default)]
pub struct IndexRegistry {
    registrations: RwLock<HashMap<IndexKey, Registration>>,
    configurator: DefaultIndexConfigurator,
    validator: IndexConfigurationValidator,
}

impl IndexRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_open_registration<T>(
        &self,
        key: IndexKey,
        update: impl FnOnce(&mut Registration) -> T,
    ) -> Result<T> {
        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let registration = registrations.entry(key.clone()).or_default();
        if registration.resolved {
            return Err(Error::RegistrationClosed { key });
        }
        let result = update(registration);
        registration.generation += 1;
        Ok(result)
    }

    /// Register `key`, appending `configure` to its overrides if given.
    ///
    /// Registering a key again keeps everything registered before.
    ///
    /// # Errors
    ///
    /// [`Error::RegistrationClosed`] once the key has been resolved.
    pub fn register(&self, key: impl Into<IndexKey>, configure: Option<ConfigureFn>) -> Result<()> {
        let key = key.into();
        let overrides = self.with_open_registration(key.clone(), |registration| {
            if let Some(configure) = configure {
                registration.overrides.push(configure);
            }
            registration.overrides.len()
        })?;
        log::debug!("Registered index '{key}' ({overrides} overrides)");
        Ok(())
    }

    /// Register the unnamed index with an override.
    pub fn add_index<F>(&self, configure: F) -> Result<()>
    where
        F: Fn(&mut IndexConfiguration) + Send + Sync + 'static,
    {
        self.register(IndexKey::DEFAULT, Some(Arc::new(configure)))
    }

    /// Register a named index with an override.
    pub fn add_named_index<F>(&self, name: impl Into<String>, configure: F) -> Result<()>
    where
        F: Fn(&mut IndexConfiguration) + Send + Sync + 'static,
    {
        self.register(IndexKey::named(name), Some(Arc::new(configure)))
    }

    /// Append an override to `key`, registering it if needed.
    pub fn configure<F>(&self, key: impl Into<IndexKey>, configure: F) -> Result<()>
    where
        F: Fn(&mut IndexConfiguration) + Send + Sync + 'static,
    {
        self.register(key, Some(Arc::new(configure)))
    }

    /// Overlay the set fields of `overlay` onto the base record of `key`.
    ///
    /// Fields the overlay leaves unset keep their earlier value, so repeated
    /// calls compose. Overrides registered for the key are kept and still
    /// run afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::RegistrationClosed`] once the key has been resolved.
    pub fn register_configuration(
        &self,
        key: impl Into<IndexKey>,
        overlay: ConfigurationOverlay,
    ) -> Result<()> {
        let key = key.into();
        self.with_open_registration(key.clone(), |registration| {
            overlay.apply_to(&mut registration.base);
        })?;
        log::debug!("Registered base configuration for index '{key}'");
        Ok(())
    }

    /// Register every index of a settings file. Returns the number of entries.
    ///
    /// All or nothing: if any entry names a closed registration, no entry is
    /// applied.
    ///
    /// # Errors
    ///
    /// [`Error::RegistrationClosed`] naming the first resolved key.
    pub fn register_from_config(&self, config: &LucentConfig) -> Result<usize> {
        let overlays: Vec<(IndexKey, ConfigurationOverlay)> = config
            .entries()
            .map(|(key, settings)| (key, settings.to_overlay()))
            .collect();

        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((key, _)) = overlays
            .iter()
            .find(|(key, _)| registrations.get(key).is_some_and(|r| r.resolved))
        {
            return Err(Error::RegistrationClosed { key: key.clone() });
        }

        let count = overlays.len();
        for (key, overlay) in overlays {
            let registration = registrations.entry(key).or_default();
            overlay.apply_to(&mut registration.base);
            registration.generation += 1;
        }
        drop(registrations);

        log::debug!("Registered {count} indexes from settings");
        Ok(count)
    }

    /// Whether `key` has been registered.
    pub fn is_registered(&self, key: &IndexKey) -> bool {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Registered keys, sorted; the default key sorts first.
    pub fn keys(&self) -> Vec<IndexKey> {
        let mut keys: Vec<IndexKey> = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Produce the validated configuration of `key` without building anything.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownIndex`] if `key` was never registered
    /// - [`Error::ConfigurationInvalid`] listing every missing required field
    pub fn snapshot(&self, key: &IndexKey) -> Result<Arc<IndexConfiguration>> {
        self.snapshot_generation(key).map(|(config, _)| config)
    }

    fn snapshot_generation(&self, key: &IndexKey) -> Result<(Arc<IndexConfiguration>, u64)> {
        let (mut config, overrides, generation) = {
            let registrations = self
                .registrations
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            let registration = registrations
                .get(key)
                .ok_or_else(|| Error::UnknownIndex { key: key.clone() })?;
            (
                registration.base.clone(),
                registration.overrides.clone(),
                registration.generation,
            )
        };

        self.configurator.configure(&mut config);
        for configure in &overrides {
            configure(&mut config);
        }
        self.validator.validate(key, &config)?;

        log::debug!("Built configuration snapshot for index '{key}'");
        Ok((Arc::new(config), generation))
    }

    /// Start a new resolution scope.
    pub fn create_scope(&self) -> IndexScope {
        IndexScope::new()
    }

    /// The bundle of `key` within `scope`, building it on first use.
    ///
    /// # Errors
    ///
    /// Anything [`IndexRegistry::snapshot`] or
    /// [`factory::build_writer`] returns. Nothing is cached on failure.
    pub fn resolve(
        &self,
        key: impl Into<IndexKey>,
        scope: &mut IndexScope,
    ) -> Result<Arc<ResourceBundle>> {
        let key = key.into();
        if let Some(bundle) = scope.get(&key) {
            return Ok(Arc::clone(bundle));
        }

        loop {
            let (config, generation) = self.snapshot_generation(&key)?;
            let writer = factory::build_writer(&key, &config)?;

            let first = {
                let mut registrations = self
                    .registrations
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                let registration = registrations
                    .get_mut(&key)
                    .ok_or_else(|| Error::UnknownIndex { key: key.clone() })?;
                if registration.generation != generation {
                    None
                } else {
                    Some(!std::mem::replace(&mut registration.resolved, true))
                }
            };

            let Some(first) = first else {
                log::debug!("Registration of index '{key}' changed while resolving; retrying");
                drop(writer);
                continue;
            };

            if first {
                log::info!("Index '{key}' resolved for the first time in scope {}", scope.id());
            } else {
                log::debug!("Resolved index '{key}' in scope {}", scope.id());
            }

            let bundle = Arc::new(ResourceBundle::new(key.clone(), config, writer));
            scope.insert(key, Arc::clone(&bundle));
            return Ok(bundle);
        }
    }
}

impl fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
