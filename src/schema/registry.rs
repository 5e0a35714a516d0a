//! Schema registry: a memoizing factory of per-namespace bundles
//!
//! Lifecycle:
//! - starts empty
//! - a bundle is built the first time its namespace is requested
//! - the same `Arc` is returned for every later request
//! - entries are only dropped by an explicit `clear()`
//!
//! The lock is held while a missing bundle is built. Building is pure and
//! short, and holding the lock guarantees concurrent first requests for one
//! namespace observe a single bundle.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::config::{ConfigResult, RegistryConfig};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};

use super::bundle::SchemaBundle;
use super::errors::{SchemaError, SchemaResult};
use super::namespace::Namespace;

/// Registry of schema bundles keyed by namespace name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    config: RegistryConfig,
    bundles: Mutex<HashMap<String, Arc<SchemaBundle>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            bundles: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an empty registry from a config file and applies its log level.
    pub fn from_config_file(path: &Path) -> ConfigResult<Self> {
        let config = RegistryConfig::load(path)?;
        Logger::set_min_severity(config.log_severity()?);
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the bundle for `name`, building it on first request.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` (EALGIS_INVALID_NAMESPACE) if `name` is not a
    ///   valid namespace. Nothing is cached in that case.
    /// - EALGIS_REGISTRY_UNAVAILABLE if the lock was poisoned.
    pub fn get_schema(&self, name: &str) -> SchemaResult<Arc<SchemaBundle>> {
        let mut bundles = self
            .bundles
            .lock()
            .map_err(|_| SchemaError::registry_unavailable())?;

        if let Some(bundle) = bundles.get(name) {
            log_event_with_fields(Event::SchemaCacheHit, &[("namespace", name)]);
            return Ok(Arc::clone(bundle));
        }

        let namespace = Namespace::new(name).map_err(|e| {
            log_event_with_fields(
                Event::NamespaceRejected,
                &[("namespace", name), ("reason", e.message())],
            );
            e
        })?;

        let bundle = Arc::new(SchemaBundle::build(namespace, &self.config));
        bundles.insert(name.to_string(), Arc::clone(&bundle));

        let tables = bundle.tables().count().to_string();
        log_event_with_fields(
            Event::SchemaRegistered,
            &[
                ("namespace", name),
                ("tables", tables.as_str()),
                ("version", bundle.version()),
            ],
        );

        Ok(bundle)
    }

    /// Cache lock for read-only and clearing paths. A panic while held
    /// cannot leave the map half-written, so a poisoned guard is still
    /// consistent.
    fn cached(&self) -> MutexGuard<'_, HashMap<String, Arc<SchemaBundle>>> {
        match self.bundles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns true if a bundle for `name` has been built.
    pub fn contains(&self, name: &str) -> bool {
        self.cached().contains_key(name)
    }

    /// Number of cached bundles.
    pub fn len(&self) -> usize {
        self.cached().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached namespace names, sorted.
    pub fn schema_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cached().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops every cached bundle. Bundles already handed out stay valid;
    /// the next request for a namespace builds a new instance.
    pub fn clear(&self) {
        self.cached().clear();
        log_event(Event::RegistryCleared);
    }
}

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// Installs the config of the process-wide registry.
///
/// Returns false if the global registry was already initialised, in which
/// case `config` is ignored.
pub fn configure_global(config: RegistryConfig) -> bool {
    GLOBAL.set(SchemaRegistry::new(config)).is_ok()
}

/// The process-wide registry, created with the default config on first use.
pub fn global() -> &'static SchemaRegistry {
    GLOBAL.get_or_init(SchemaRegistry::default)
}

/// `get_schema` against the process-wide registry.
pub fn get_schema(name: &str) -> SchemaResult<Arc<SchemaBundle>> {
    global().get_schema(name)
}
