//! Append-only log of failed transfers.
//!
//! The protocol only tells git-lfs that a transfer failed; the command that
//! was run, its stderr, and the request that triggered it end up here.
//!
//! # Layout
//!
//! ```text
//! {log_dir}/
//!   errors.log    — one line per failed transfer
//! ```

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const APP_DIR: &str = "git-lfs-agent-scp";
const LOGS_DIR: &str = "logs";
const LOG_FILE: &str = "errors.log";

/// Environment variable overriding the agent's home directory.
pub const ENV_HOME: &str = "LFS_SCP_HOME";

/// One failed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Short description, e.g. `upload failed`.
    pub message: String,
    /// The copy command line that was attempted.
    pub command: String,
    /// The request as received, serialized as JSON.
    pub request: String,
    /// How the copy program ended, e.g. `exit status: 1`.
    pub status: String,
    /// Whatever the copy program wrote to stderr.
    pub stderr: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (request json: {}) {}",
            self.message, self.command, self.request, self.status
        )?;
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            // Keep the record on one line.
            write!(f, " stderr: {}", stderr.lines().collect::<Vec<_>>().join(" | "))?;
        }
        Ok(())
    }
}

/// Process-wide sink for [`FailureRecord`]s.
///
/// Opened once before the event loop starts. Every write error is swallowed
/// (and traced): a broken log must never break a transfer response.
#[derive(Debug)]
pub struct FailureLog {
    /// Log file path, if one was configured.
    path: Option<PathBuf>,
    /// Open append handle; `None` when disabled or when opening failed.
    file: Option<File>,
}

impl FailureLog {
    /// Creates `dir` if needed and opens `dir/errors.log` for appending.
    ///
    /// Never fails. If the directory or file cannot be created the sink
    /// stays usable but discards records.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let path = dir.join(LOG_FILE);
        let file = fs::create_dir_all(dir)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
        match file {
            Ok(file) => {
                tracing::debug!(path = %path.display(), "failure log opened");
                Self {
                    path: Some(path),
                    file: Some(file),
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot open failure log");
                Self {
                    path: Some(path),
                    file: None,
                }
            }
        }
    }

    /// A sink that drops every record.
    pub const fn disabled() -> Self {
        Self {
            path: None,
            file: None,
        }
    }

    /// Default log directory: `$LFS_SCP_HOME/logs` or
    /// `<platform_local_data_dir>/git-lfs-agent-scp/logs`.
    pub fn default_dir() -> Option<PathBuf> {
        let home = if let Some(home) = std::env::var_os(ENV_HOME) {
            PathBuf::from(home)
        } else {
            dirs::data_local_dir()?.join(APP_DIR)
        };
        Some(home.join(LOGS_DIR))
    }

    /// Path of the log file, if one was configured.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Appends `record` as a single timestamped line.
    pub fn append(&mut self, record: &FailureRecord) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if let Err(e) = writeln!(file, "{secs} {record}").and_then(|()| file.flush()) {
            tracing::warn!(error = %e, "cannot write failure log");
        }
    }
}
