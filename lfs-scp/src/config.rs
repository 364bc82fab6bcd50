//! Startup configuration.

use std::path::PathBuf;

use crate::log::FailureLog;
use crate::remote::RemoteTarget;
use crate::transfer::{CopyCommand, Transfer};
use crate::{Error, Result};

/// Everything needed to start a [`Transfer`] executor.
///
/// Built with chained setters; [`Config::build`] validates the values and
/// opens the failure log exactly once.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote prefix tokens, joined with spaces.
    remote: Vec<String>,
    /// Copy program and its leading arguments.
    copier: CopyCommand,
    /// Download directory; the system temp directory when unset.
    scratch_dir: Option<PathBuf>,
    /// Failure log directory; [`FailureLog::default_dir`] when unset.
    log_dir: Option<PathBuf>,
}

impl Config {
    /// Starts a configuration for the given remote prefix tokens.
    pub fn new<I, S>(remote: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            remote: remote.into_iter().map(Into::into).collect(),
            copier: CopyCommand::default(),
            scratch_dir: None,
            log_dir: None,
        }
    }

    /// Sets the copy program (default `scp -B`).
    #[must_use]
    pub fn copier(mut self, copier: CopyCommand) -> Self {
        self.copier = copier;
        self
    }

    /// Sets the directory downloads are written to.
    #[must_use]
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Sets the failure log directory.
    #[must_use]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Validates the configuration and opens the failure log.
    pub fn build(self) -> Result<Transfer> {
        let remote = RemoteTarget::from_args(&self.remote)?;

        let scratch_dir = self.scratch_dir.unwrap_or_else(std::env::temp_dir);
        if !scratch_dir.is_dir() {
            return Err(Error::ScratchDir(scratch_dir));
        }

        let log = self
            .log_dir
            .or_else(FailureLog::default_dir)
            .map_or_else(FailureLog::disabled, FailureLog::open);
        if log.path().is_none() {
            tracing::warn!("no log directory available; failures will only be traced");
        }

        tracing::debug!(
            remote = %remote,
            program = self.copier.program(),
            scratch = %scratch_dir.display(),
            "transfer agent configured"
        );
        Ok(Transfer::new(remote, self.copier, scratch_dir, log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_explicit_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let logs = tmp.path().join("logs");

        let t = Config::new(["host:/srv", "lfs"])
            .scratch_dir(tmp.path())
            .log_dir(&logs)
            .build()
            .unwrap();

        assert_eq!(t.remote().as_str(), "host:/srv lfs");
        assert_eq!(t.scratch_dir(), tmp.path());
        assert!(logs.is_dir());
    }

    #[test]
    fn rejects_missing_scratch_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        let err = Config::new(["host:"])
            .scratch_dir(&missing)
            .log_dir(tmp.path())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ScratchDir(p) if p == missing));
    }

    #[test]
    fn rejects_empty_remote() {
        let tmp = tempfile::tempdir().unwrap();
        let none: [&str; 0] = [];
        let err = Config::new(none).log_dir(tmp.path()).build().unwrap_err();
        assert!(matches!(err, Error::EmptyRemote));
    }
}
