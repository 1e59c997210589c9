//! Resource module - readiness checks and scheme-based dispatch
//!
//! A resource is anything that can answer "are you ready?" once per attempt:
//! a TCP service, an HTTP endpoint, a file, or any user-defined check.
//! Resources are built from a URL by a [`ResourceFactory`] selected by the
//! URL's scheme.
//!
//! # Overview
//!
//! - `Resource` trait: the single readiness operation every kind implements
//! - `ResourceFactory`: constructor from a parsed URL
//! - `ResourceConfig`: a factory bound to one or more schemes
//! - `Registry`: scheme → factory lookup
//!
//! # Built-in Resources
//!
//! - `file`: ready when the path exists
//! - `tcp`: ready when a TCP connection succeeds
//! - `http` / `https`: ready when a GET returns a 2xx status
//!
//! # Example
//!
//! ```rust
//! use waitfor::resource::{Registry, Resource, ResourceConfig};
//! use waitfor::{Result, WaitContext};
//! use async_trait::async_trait;
//!
//! struct AlwaysReady;
//!
//! #[async_trait]
//! impl Resource for AlwaysReady {
//!     async fn check(&self, _ctx: &WaitContext) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut registry = Registry::new();
//! registry
//!     .register("ready", waitfor::resource::factory(|_url| Ok(Box::new(AlwaysReady))))
//!     .unwrap();
//!
//! let resource = registry.resolve("ready://anything").unwrap();
//! assert!(resource.check(&WaitContext::new()).await.is_ok());
//! # });
//! ```

pub mod file;
pub mod http;
mod registry;
pub mod tcp;

pub use registry::Registry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::context::WaitContext;
use crate::error::Result;

/// A pollable dependency.
///
/// `check` is called once per attempt on the same instance, so it must be
/// safe to call repeatedly. Implementations should return promptly once
/// `ctx` ends; the retry loop also races every call against `ctx`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resource: Send + Sync {
    /// Report `Ok(())` when ready, or a descriptive failure otherwise.
    async fn check(&self, ctx: &WaitContext) -> Result<()>;
}

/// Builds a [`Resource`] from a parsed location.
pub type ResourceFactory = Arc<dyn Fn(&Url) -> Result<Box<dyn Resource>> + Send + Sync>;

/// Wrap a closure as a [`ResourceFactory`].
pub fn factory<F>(f: F) -> ResourceFactory
where
    F: Fn(&Url) -> Result<Box<dyn Resource>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A function that declares the schemes it serves and the factory for them.
///
/// Lets resource kinds live in their own modules and be plugged into a
/// runner with [`ResourceConfig::from_module`].
pub type Module = fn() -> (Vec<String>, ResourceFactory);

/// A factory bound to a set of schemes.
#[derive(Clone)]
pub struct ResourceConfig {
    /// Schemes served by `factory` (e.g. `["http", "https"]`).
    pub schemes: Vec<String>,
    /// Constructor shared by all of `schemes`.
    pub factory: ResourceFactory,
}

impl ResourceConfig {
    /// Bind `factory` to every scheme in `schemes`.
    pub fn new<I, S>(schemes: I, factory: ResourceFactory) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            factory,
        }
    }

    /// Convert a [`Module`] into a config.
    pub fn from_module(module: Module) -> Self {
        let (schemes, factory) = module();
        Self { schemes, factory }
    }
}

impl fmt::Debug for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfig")
            .field("schemes", &self.schemes)
            .finish_non_exhaustive()
    }
}

/// Configs for every resource kind shipped with the crate.
pub fn builtin() -> Vec<ResourceConfig> {
    vec![
        ResourceConfig::from_module(file::module),
        ResourceConfig::from_module(tcp::module),
        ResourceConfig::from_module(http::module),
    ]
}
