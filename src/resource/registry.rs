//! Scheme registry for waitfor
//!
//! This module provides the `Registry` struct that maps URL schemes to
//! resource factories. Resolution parses a location, looks up its scheme and
//! hands the parsed URL to the bound factory.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};
use url::Url;

use crate::error::{Result, WaitError};

use super::{Resource, ResourceConfig, ResourceFactory};

/// A registry that maps schemes to resource factories.
///
/// At most one factory is bound per scheme; registering a taken scheme is an
/// error and leaves the existing binding in place. Registration needs
/// `&mut self`, so a registry cannot change while a runner is resolving
/// locations through a shared reference.
///
/// # Example
///
/// ```rust
/// use waitfor::resource::{builtin, Registry};
///
/// let registry = Registry::from_configs(builtin()).unwrap();
/// assert!(registry.contains("tcp"));
/// assert!(registry.resolve("tcp://localhost:5432").is_ok());
/// assert!(registry.resolve("redis://localhost").is_err());
/// ```
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, ResourceFactory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a list of configs.
    ///
    /// Fails on the first scheme that appears twice.
    pub fn from_configs(configs: impl IntoIterator<Item = ResourceConfig>) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs {
            for scheme in &config.schemes {
                registry.register(scheme, config.factory.clone())?;
            }
        }
        Ok(registry)
    }

    /// Bind `factory` to `scheme`.
    ///
    /// Surrounding whitespace is trimmed from `scheme`. Returns
    /// [`WaitError::DuplicateScheme`] if the scheme is already bound.
    pub fn register(&mut self, scheme: &str, factory: ResourceFactory) -> Result<()> {
        let scheme = scheme.trim();
        if self.factories.contains_key(scheme) {
            return Err(WaitError::DuplicateScheme(scheme.to_string()));
        }
        info!(scheme, "Registering resource");
        self.factories.insert(scheme.to_string(), factory);
        Ok(())
    }

    /// Build a resource for `location`.
    ///
    /// Errors:
    /// - [`WaitError::InvalidLocation`] if `location` is not a URL
    /// - [`WaitError::UnknownScheme`] if no factory serves its scheme
    /// - whatever the factory itself returns
    pub fn resolve(&self, location: &str) -> Result<Box<dyn Resource>> {
        let url = Url::parse(location).map_err(|source| WaitError::InvalidLocation {
            location: location.to_string(),
            source,
        })?;

        let factory = self
            .factories
            .get(url.scheme())
            .ok_or_else(|| WaitError::UnknownScheme(url.scheme().to_string()))?;

        debug!(location, scheme = url.scheme(), "Resolved resource");
        factory(&url)
    }

    /// Schemes currently bound, in no particular order.
    pub fn list(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Whether `scheme` is bound.
    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(scheme)
    }

    /// Number of bound schemes.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no scheme is bound.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.list())
            .finish()
    }
}
