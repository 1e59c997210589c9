//! Runner - concurrent readiness testing and gated program execution
//!
//! [`Runner::test`] resolves every location through the [`Registry`], then
//! runs one retry loop per resource in its own task. All tasks share the
//! caller's [`WaitContext`] and are joined before the verdict is produced;
//! one failing location never short-circuits the others.
//!
//! [`Runner::run`] does the same for a [`Program`]'s resources and, only if
//! every one became ready, executes the program and returns its output.

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::context::WaitContext;
use crate::error::{LocationFailure, Result, WaitError, WaitFailure};
use crate::options::Options;
use crate::resource::{builtin, Registry, ResourceConfig};
use crate::retry::retry;

/// A command gated on a set of resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Path or name of the executable.
    pub executable: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Locations that must be ready before the executable starts.
    pub resources: Vec<String>,
}

impl Program {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }
}

/// Tests resource availability and runs gated programs.
///
/// # Example
///
/// ```rust
/// use waitfor::{Options, Runner, WaitContext};
///
/// # tokio_test::block_on(async {
/// let runner = Runner::builtin().unwrap();
/// let ctx = WaitContext::new();
///
/// // Nothing to wait for.
/// let empty: [&str; 0] = [];
/// assert!(runner.test(&ctx, &empty, Options::default()).await.is_ok());
///
/// // Unknown schemes fail without retrying.
/// let err = runner
///     .test(&ctx, &["redis://localhost:6379"], Options::default())
///     .await
///     .unwrap_err();
/// assert!(err.to_string().contains("redis"));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct Runner {
    registry: Registry,
}

impl Runner {
    /// Create a runner serving the given resource kinds.
    ///
    /// Fails if two configs claim the same scheme.
    pub fn new(configs: impl IntoIterator<Item = ResourceConfig>) -> Result<Self> {
        Ok(Self {
            registry: Registry::from_configs(configs)?,
        })
    }

    /// Create a runner with the built-in `file`, `tcp` and `http(s)` kinds.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin())
    }

    /// Create a runner around an existing registry.
    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry used to resolve locations.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access for registering more resource kinds.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Wait until every location is ready.
    ///
    /// Each location is resolved once and then checked under its own retry
    /// loop; resolution failures are terminal and use no attempts. Returns
    /// `Ok(())` only if every location became ready, otherwise a
    /// [`WaitError::Wait`] listing each failed location in input order.
    pub async fn test<S: AsRef<str>>(
        &self,
        ctx: &WaitContext,
        locations: &[S],
        options: Options,
    ) -> Result<()> {
        options.validate()?;
        if locations.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let mut outcomes: Vec<Option<Result<u32>>> = (0..locations.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, location) in locations.iter().enumerate() {
            let location = location.as_ref();
            match self.registry.resolve(location) {
                Ok(resource) => {
                    let ctx = ctx.clone();
                    let location = location.to_string();
                    tasks.spawn(async move {
                        let result = retry(&location, resource.as_ref(), &ctx, options).await;
                        (index, result)
                    });
                }
                Err(e) => {
                    warn!(location, error = %e, "Cannot resolve resource");
                    outcomes[index] = Some(Err(e));
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(result),
                Err(e) => error!(error = %e, "Resource task failed"),
            }
        }

        let mut failures = Vec::new();
        for (location, outcome) in locations.iter().zip(outcomes) {
            let location = location.as_ref();
            match outcome {
                Some(Ok(attempts)) => debug!(location, attempts, "Resource ready"),
                Some(Err(error)) => failures.push(LocationFailure {
                    location: location.to_string(),
                    error,
                }),
                None => failures.push(LocationFailure {
                    location: location.to_string(),
                    error: WaitError::not_ready("readiness check panicked"),
                }),
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        if failures.is_empty() {
            info!(resources = locations.len(), duration_ms, "All resources ready");
            Ok(())
        } else {
            warn!(
                resources = locations.len(),
                failed = failures.len(),
                duration_ms,
                "Resources not ready"
            );
            Err(WaitFailure::new(failures).into())
        }
    }

    /// Wait for `program.resources`, then run `program` and return its
    /// combined output (stdout followed by stderr).
    ///
    /// The program is never started if any resource failed. A program that
    /// cannot be started or exits unsuccessfully yields
    /// [`WaitError::Spawn`] or [`WaitError::Execution`], never a wait error.
    pub async fn run(
        &self,
        ctx: &WaitContext,
        program: &Program,
        options: Options,
    ) -> Result<Vec<u8>> {
        self.test(ctx, &program.resources, options).await?;

        info!(program = %program.executable, args = ?program.args, "Starting program");
        let output = Command::new(&program.executable)
            .args(&program.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| WaitError::Spawn {
                program: program.executable.clone(),
                source,
            })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            Ok(combined)
        } else {
            Err(WaitError::Execution {
                program: program.executable.clone(),
                status: output.status,
                output: combined,
            })
        }
    }
}
