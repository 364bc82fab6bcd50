//! git-lfs-agent-scp — standalone Git LFS transfer agent using scp.
//!
//! git-lfs owns stdin/stdout; diagnostics go to stderr, which git shows
//! with `GIT_TRACE=1`.

#![allow(clippy::print_stderr, clippy::missing_docs_in_private_items)]

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lfs_scp::{Agent, Config, CopyCommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "git-lfs-agent-scp",
    version,
    about = "Git LFS custom transfer agent that copies objects with scp"
)]
struct Cli {
    /// Directory for downloaded objects [default: system temp directory].
    #[arg(long, value_name = "DIR")]
    tmpdir: Option<PathBuf>,

    /// Directory for the failure log [default: $LFS_SCP_HOME/logs].
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Copy program.
    #[arg(long, default_value = "scp")]
    program: String,

    /// Argument passed to the copy program before source and destination.
    #[arg(
        long = "arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        default_value = "-B"
    )]
    args: Vec<String>,

    /// Remote prefix (e.g. user@host:/srv/lfs). Several tokens are joined
    /// with spaces.
    #[arg(required = true, num_args = 1.., value_name = "REMOTE")]
    remote: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    if let Err(e) = cli.run() {
        eprintln!("git-lfs-agent-scp: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn config(self) -> Config {
        let mut config = Config::new(self.remote)
            .copier(CopyCommand::new(self.program).args(self.args));
        if let Some(dir) = self.tmpdir {
            config = config.scratch_dir(dir);
        }
        if let Some(dir) = self.log_dir {
            config = config.log_dir(dir);
        }
        config
    }

    fn run(self) -> Result<()> {
        let mut agent =
            Agent::from_config(self.config(), io::stdout().lock()).context("invalid configuration")?;
        agent
            .run(io::stdin().lock())
            .context("transfer agent stopped")
    }
}

/// Logs to stderr. `RUST_LOG` takes precedence; otherwise `warn`, or
/// `debug` when `GIT_TRACE` is enabled.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if git_trace() {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };
        EnvFilter::default().add_directive(level.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

/// `GIT_TRACE` is set to anything other than empty, `0` or `false`.
fn git_trace() -> bool {
    std::env::var("GIT_TRACE")
        .is_ok_and(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"))
}
