//! Git LFS custom transfer agent backed by `scp`.
//!
//! git-lfs starts the agent as a child process and speaks the custom
//! transfer protocol to it over stdin/stdout. Each upload or download is
//! handed to an external copy program, `scp -B` unless configured
//! otherwise, against a fixed remote prefix.
//!
//! # Quick start
//!
//! ```no_run
//! use lfs_scp::{Agent, Config};
//!
//! let config = Config::new(["backup@nas:/srv/lfs"]);
//! let mut agent = Agent::from_config(config, std::io::stdout().lock())
//!     .expect("invalid configuration");
//! agent.run(std::io::stdin().lock()).expect("protocol error");
//! ```
//!
//! Configure git to use it:
//!
//! ```text
//! git config lfs.standalonetransferagent scp
//! git config lfs.customtransfer.scp.path git-lfs-agent-scp
//! git config lfs.customtransfer.scp.args "backup@nas:/srv/lfs"
//! ```

mod agent;
mod config;
mod error;
mod log;
mod remote;
mod transfer;

pub use agent::Agent;
pub use config::Config;
pub use error::{Error, Result};
pub use log::{ENV_HOME, FailureLog, FailureRecord};
pub use remote::RemoteTarget;
pub use transfer::{CopyCommand, Transfer};
