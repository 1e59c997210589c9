//! waitfor - block until external dependencies become reachable
//!
//! Declare databases, HTTP endpoints, files or any custom resource by URL,
//! then wait for all of them in parallel. Each resource is retried under its
//! own exponential backoff; every task shares one cancellation context, and
//! the failures of all resources are reported together.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use waitfor::{Options, Program, Runner, WaitContext};
//!
//! # async fn example() -> waitfor::Result<()> {
//! let runner = Runner::builtin()?;
//! let ctx = WaitContext::with_timeout(Duration::from_secs(120));
//!
//! runner
//!     .test(
//!         &ctx,
//!         &["tcp://localhost:5432", "http://localhost:8080/health"],
//!         Options::default().with_attempts(10),
//!     )
//!     .await?;
//!
//! let program = Program::new("./server").with_resources(["file:///run/secrets/token"]);
//! let output = runner.run(&ctx, &program, Options::default()).await?;
//! # let _ = output;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod options;
pub mod resource;
pub mod retry;
pub mod runner;
pub mod utils;

pub use config::Config;
pub use context::WaitContext;
pub use error::{CancelReason, ErrorKind, LocationFailure, Result, WaitError, WaitFailure};
pub use options::Options;
pub use resource::{Registry, Resource, ResourceConfig, ResourceFactory};
pub use runner::{Program, Runner};
