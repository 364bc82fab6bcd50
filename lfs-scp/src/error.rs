//! Error types for the transfer agent.

use std::path::PathBuf;

/// Alias for `Result<T, lfs_scp::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop the agent.
///
/// A failed copy is not an error at this level: it is reported to git-lfs
/// as a `complete` response and the loop carries on.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The host sent a line that does not decode to a known event.
    #[error("protocol error: {0}")]
    Protocol(#[source] std::io::Error),

    /// No remote destination was given.
    #[error("remote target is empty")]
    EmptyRemote,

    /// The configured scratch directory is missing or not a directory.
    #[error("scratch directory {} is not a directory", .0.display())]
    ScratchDir(PathBuf),

    /// Reading stdin or writing stdout failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
