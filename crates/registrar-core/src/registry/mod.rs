//! Plugin-based registrar registry
//!
//! Registrar adapters are registered by type name at startup so that the
//! binary never hard-codes which adapters exist.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use registrar_core::{RegistrarConfig, RegistrarRegistry};
//!
//! let registry = RegistrarRegistry::new();
//! registrar_godaddy::register(&registry);
//!
//! let config = RegistrarConfig::godaddy("key", "secret");
//! let registrar = registry.create_registrar(&config)?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::RegistrarConfig;
use crate::error::{Error, Result};
use crate::traits::{Registrar, RegistrarFactory};

/// Registry of registrar factories keyed by type name
///
/// ## Thread Safety
///
/// Interior mutability through `RwLock`: concurrent lookups, exclusive
/// registration.
#[derive(Default)]
pub struct RegistrarRegistry {
    registrars: RwLock<HashMap<String, Box<dyn RegistrarFactory>>>,
}

impl RegistrarRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a registrar factory under `name` (e.g. "godaddy")
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_registrar(&self, name: impl Into<String>, factory: Box<dyn RegistrarFactory>) {
        let name = name.into();
        tracing::debug!("Registering registrar factory '{}'", name);
        let mut registrars = self
            .registrars
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        registrars.insert(name, factory);
    }

    /// Create a registrar from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Registrar>)`: Created registrar instance
    /// - `Err(Error::Config)`: Unknown type, or the factory rejected the config
    pub fn create_registrar(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        config.validate()?;

        let registrar_type = config.type_name();
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = registrars
            .get(registrar_type)
            .ok_or_else(|| Error::config(format!("Unknown registrar type: {}", registrar_type)))?;

        factory.create(config)
    }

    /// List all registered registrar types, sorted
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = registrars.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a registrar type is registered
    pub fn has_registrar(&self, name: &str) -> bool {
        self.registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
