//! CLI module: flag parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.
//!
//! ```text
//! waitfor -r tcp://db:5432 -r http://api:8080/health -- ./server --port 80
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;

use waitfor::config::{Config, LogFormat};
use waitfor::utils::logging::init_logging;
use waitfor::{Program, Runner, WaitContext, WaitError};

#[derive(Parser, Debug)]
#[command(name = "waitfor")]
#[command(version)]
#[command(
    about = "Wait for resources to become available, then run a program",
    long_about = None
)]
struct Cli {
    /// Resource location to wait for, e.g. tcp://db:5432 (repeatable)
    #[arg(short, long = "resource", value_name = "URL")]
    resources: Vec<String>,
    /// Initial interval between attempts, in seconds [default: 5]
    #[arg(long, value_name = "SECONDS")]
    interval: Option<u64>,
    /// Maximum interval between attempts, in seconds [default: 60]
    #[arg(long, value_name = "SECONDS")]
    max_interval: Option<u64>,
    /// Attempts per resource; 0 selects the default [default: 5]
    #[arg(short, long)]
    attempts: Option<u32>,
    /// Interval growth factor [default: 1.5]
    #[arg(long)]
    multiplier: Option<f64>,
    /// Interval randomization factor in [0, 1] [default: 0.5]
    #[arg(long)]
    jitter: Option<f64>,
    /// Give up on every resource after this many seconds
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,
    /// Config file (defaults to ~/.waitfor/config.json when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log filter when RUST_LOG is unset (e.g. info, waitfor=debug)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Log format: pretty, compact or json
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
    /// Print the supported URL schemes and exit
    #[arg(long)]
    list_schemes: bool,
    /// Program and arguments to run once every resource is ready
    #[arg(last = true, value_name = "PROGRAM")]
    command: Vec<String>,
}

impl Cli {
    /// Layer command-line flags over file and environment settings.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(v) = self.interval {
            config.retry.interval = v;
        }
        if let Some(v) = self.max_interval {
            config.retry.max_interval = v;
        }
        if let Some(v) = self.attempts {
            config.retry.attempts = v;
        }
        if let Some(v) = self.multiplier {
            config.retry.multiplier = v;
        }
        if let Some(v) = self.jitter {
            config.retry.jitter = v;
        }
        if let Some(v) = self.timeout {
            config.retry.timeout = Some(v);
        }
        if let Some(ref v) = self.log_level {
            config.logging.level = v.clone();
        }
        if let Some(v) = self.log_format {
            config.logging.format = v;
        }
    }

    fn load_config(&self) -> Result<Config> {
        let config = match self.config {
            Some(ref path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                Config::load_from_path(path)
            }
            None => Config::load(),
        };
        config.context("failed to load configuration")
    }

    fn program(&self) -> Option<Program> {
        let (executable, args) = self.command.split_first()?;
        Some(
            Program::new(executable.clone())
                .with_args(args.iter().cloned())
                .with_resources(self.resources.iter().cloned()),
        )
    }
}

/// Cancel `ctx` on Ctrl-C so pending waits end promptly.
fn cancel_on_interrupt(ctx: &WaitContext) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling pending waits");
            ctx.cancel();
        }
    });
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = cli.load_config()?;
    cli.apply_overrides(&mut config);
    init_logging(&config.logging);

    let runner = Runner::builtin()?;

    if cli.list_schemes {
        let mut schemes = runner.registry().list();
        schemes.sort_unstable();
        for scheme in schemes {
            println!("{}", scheme);
        }
        return Ok(());
    }

    if cli.resources.is_empty() && cli.command.is_empty() {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    }

    let ctx = match config.retry.timeout() {
        Some(timeout) => WaitContext::with_timeout(timeout),
        None => WaitContext::new(),
    };
    cancel_on_interrupt(&ctx);
    let options = config.retry.to_options();

    let Some(program) = cli.program() else {
        runner.test(&ctx, &cli.resources, options).await?;
        return Ok(());
    };

    match runner.run(&ctx, &program, options).await {
        Ok(output) => {
            std::io::stdout().write_all(&output)?;
            Ok(())
        }
        Err(WaitError::Execution { status, output, .. }) => {
            std::io::stdout().write_all(&output)?;
            std::io::stdout().flush()?;
            std::process::exit(status.code().unwrap_or(1));
        }
        Err(e) => Err(e.into()),
    }
}
