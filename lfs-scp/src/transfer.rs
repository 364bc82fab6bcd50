//! Upload and download through an external copy program.
//!
//! Every transfer is one blocking run of the copy program (`scp` by
//! default) with the source and destination as its last two arguments.
//! There is no timeout: a hung copy hangs the agent, and git-lfs decides
//! what to do about it.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use lfs_scp_proto::{Complete, Download, Event, TransferError, Upload};

use crate::log::{FailureLog, FailureRecord};
use crate::remote::RemoteTarget;

/// File name prefix for downloaded objects in the scratch directory.
const TMP_PREFIX: &str = "git-lfs-agent-scp-";

/// External program used to move bytes, plus its leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCommand {
    /// Executable path or name, resolved through `PATH`.
    program: String,
    /// Arguments placed before source and destination.
    args: Vec<String>,
}

impl Default for CopyCommand {
    /// `scp -B`: batch mode, so a password prompt can never block the agent.
    fn default() -> Self {
        Self::new("scp").arg("-B")
    }
}

impl CopyCommand {
    /// A copy command with no leading arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends a leading argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several leading arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs `program args... -- src dst` to completion.
    ///
    /// stdin is closed and stdout/stderr are captured: the child must not
    /// touch the protocol stream.
    fn run(&self, src: &str, dst: &str) -> io::Result<Output> {
        Command::new(&self.program)
            .args(&self.args)
            .arg("--")
            .arg(src)
            .arg(dst)
            .stdin(Stdio::null())
            .output()
    }

    /// Printable command line, quoting arguments that contain whitespace.
    fn display(&self, src: &str, dst: &str) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(["--", src, dst])
            .map(|a| {
                if a.is_empty() || a.contains(char::is_whitespace) {
                    format!("{a:?}")
                } else {
                    a.to_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs uploads and downloads against a single [`RemoteTarget`].
#[derive(Debug)]
pub struct Transfer {
    /// Prefix every object path is joined onto.
    remote: RemoteTarget,
    /// Program that moves the bytes.
    copier: CopyCommand,
    /// Directory for downloaded objects.
    scratch_dir: PathBuf,
    /// Where failures are recorded.
    log: FailureLog,
}

impl Transfer {
    /// Creates an executor. `scratch_dir` must exist.
    pub const fn new(
        remote: RemoteTarget,
        copier: CopyCommand,
        scratch_dir: PathBuf,
        log: FailureLog,
    ) -> Self {
        Self {
            remote,
            copier,
            scratch_dir,
            log,
        }
    }

    /// Remote prefix in use.
    pub const fn remote(&self) -> &RemoteTarget {
        &self.remote
    }

    /// Directory downloads are written to.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Copies `req.path` to `<remote>/<oid>`.
    pub fn upload(&mut self, req: &Upload) -> Complete {
        let dst = self.remote.join(&req.oid);
        tracing::debug!(oid = %req.oid, from = %req.path, to = %dst, "upload");

        match self.copy(&req.path, &dst) {
            Ok(()) => Complete::uploaded(&req.oid),
            Err(failure) => {
                let command = self.copier.display(&req.path, &dst);
                self.fail("upload failed", command, &Event::Upload(req.clone()), failure);
                Complete::failed(&req.oid, TransferError::upload_failed())
            }
        }
    }

    /// Copies `<remote>/<oid>` into a fresh file in the scratch directory.
    ///
    /// On failure the (possibly partial) file is left behind for git-lfs to
    /// clean up.
    pub fn download(&mut self, req: &Download) -> Complete {
        let src = self.remote.join(&req.oid);
        let event = || Event::Download(req.clone());

        let tmp = match self.alloc_tmp() {
            Ok(p) => p,
            Err(e) => {
                let command = self.copier.display(&src, "<unallocated>");
                let failure = Failure {
                    status: format!("cannot create temp file in {}", self.scratch_dir.display()),
                    stderr: e.to_string(),
                };
                self.fail("download failed", command, &event(), failure);
                return Complete::failed(&req.oid, TransferError::download_failed());
            }
        };
        let dst = tmp.to_string_lossy().into_owned();
        tracing::debug!(oid = %req.oid, from = %src, to = %dst, "download");

        match self.copy(&src, &dst) {
            Ok(()) => Complete::downloaded(&req.oid, dst),
            Err(failure) => {
                let command = self.copier.display(&src, &dst);
                self.fail("download failed", command, &event(), failure);
                Complete::failed(&req.oid, TransferError::download_failed())
            }
        }
    }

    /// Creates a uniquely named, persistent file in the scratch directory.
    fn alloc_tmp(&self) -> io::Result<PathBuf> {
        let (_file, path) = tempfile::Builder::new()
            .prefix(TMP_PREFIX)
            .tempfile_in(&self.scratch_dir)?
            .keep()?;
        Ok(path)
    }

    /// Runs the copy program, mapping anything but exit code 0 to a failure.
    fn copy(&self, src: &str, dst: &str) -> Result<(), Failure> {
        match self.copier.run(src, dst) {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(Failure {
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            }),
            Err(e) => Err(Failure {
                status: format!("cannot run {}", self.copier.program()),
                stderr: e.to_string(),
            }),
        }
    }

    /// Traces a failed transfer and appends it to the failure log.
    fn fail(&mut self, message: &str, command: String, event: &Event, failure: Failure) {
        let request = serde_json::to_string(event).unwrap_or_else(|e| format!("<{e}>"));
        tracing::error!(
            command = %command,
            status = %failure.status,
            stderr = %failure.stderr.trim(),
            "{message}"
        );
        self.log.append(&FailureRecord {
            message: message.to_owned(),
            command,
            request,
            status: failure.status,
            stderr: failure.stderr,
        });
    }
}

/// Why a copy did not succeed.
#[derive(Debug)]
struct Failure {
    /// Exit status or spawn error summary.
    status: String,
    /// Captured stderr or the OS error text.
    stderr: String,
}
