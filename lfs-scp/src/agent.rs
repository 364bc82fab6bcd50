//! The event loop: read one event, act, answer, repeat.
//!
//! Strictly sequential. git-lfs writes one event and blocks until it has
//! read the response, so there is never more than one event in flight.

use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;

use lfs_scp_proto::{Event, InitAck, Response};

use crate::config::Config;
use crate::transfer::Transfer;
use crate::{Error, Result};

/// Transfer agent bound to an output stream.
#[derive(Debug)]
pub struct Agent<W> {
    /// Runs uploads and downloads.
    transfer: Transfer,
    /// Protocol output, normally stdout.
    out: W,
}

impl<W: Write> Agent<W> {
    /// Creates an agent writing responses to `out`.
    pub const fn new(transfer: Transfer, out: W) -> Self {
        Self { transfer, out }
    }

    /// Builds the executor from `config` and binds it to `out`.
    pub fn from_config(config: Config, out: W) -> Result<Self> {
        Ok(Self::new(config.build()?, out))
    }

    /// Processes events from `input` until `terminate` or end of input.
    ///
    /// Returns [`Error::Protocol`] on the first line that is not a valid
    /// event; nothing is written for that line.
    pub fn run(&mut self, mut input: impl BufRead) -> Result<()> {
        loop {
            let event = match lfs_scp_proto::read_event(&mut input) {
                Ok(Some(ev)) => ev,
                Ok(None) => {
                    tracing::debug!("end of input");
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(Error::Protocol(e));
                }
                Err(e) => return Err(e.into()),
            };
            tracing::debug!(event = event.name(), "received");

            if self.handle(event)?.is_break() {
                return Ok(());
            }
        }
    }

    /// Dispatches a single event and writes its response, if any.
    fn handle(&mut self, event: Event) -> Result<ControlFlow<()>> {
        let response = match event {
            Event::Init(init) => {
                tracing::debug!(
                    operation = init.operation.as_deref(),
                    remote = init.remote.as_deref(),
                    concurrent = init.concurrent,
                    "init"
                );
                Response::Init(InitAck {})
            }
            Event::Terminate => {
                tracing::debug!("terminate");
                return Ok(ControlFlow::Break(()));
            }
            Event::Upload(req) => self.transfer.upload(&req).into(),
            Event::Download(req) => self.transfer.download(&req).into(),
        };
        self.respond(&response)?;
        Ok(ControlFlow::Continue(()))
    }

    /// Writes one response line and flushes it.
    fn respond(&mut self, response: &Response) -> Result<()> {
        lfs_scp_proto::write_response(&mut self.out, response)?;
        tracing::debug!(?response, "sent");
        Ok(())
    }

    /// Consumes the agent, returning the output stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::transfer::CopyCommand;

    fn agent(root: &Path, copier: CopyCommand) -> Agent<Vec<u8>> {
        let scratch = root.join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        let config = Config::new([root.join("remote").to_string_lossy().into_owned()])
            .copier(copier)
            .scratch_dir(scratch)
            .log_dir(root.join("logs"));
        Agent::from_config(config, Vec::new()).unwrap()
    }

    fn run(agent: &mut Agent<Vec<u8>>, input: &str) -> Result<()> {
        agent.run(io::Cursor::new(input.as_bytes()))
    }

    fn output(agent: Agent<Vec<u8>>) -> Vec<serde_json::Value> {
        String::from_utf8(agent.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn log_lines(root: &Path) -> usize {
        fs::read_to_string(root.join("logs").join("errors.log"))
            .unwrap_or_default()
            .lines()
            .count()
    }

    #[test]
    fn init_acks_with_empty_object() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = agent(tmp.path(), CopyCommand::new("true"));
        run(&mut a, "{\"event\":\"init\"}\n{\"event\":\"init\",\"operation\":\"upload\"}\n").unwrap();

        assert_eq!(output(a), [serde_json::json!({}), serde_json::json!({})]);
    }

    #[test]
    fn successful_upload_and_download() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = agent(tmp.path(), CopyCommand::new("true"));
        let input = concat!(
            "{\"event\":\"init\"}\n",
            "{\"event\":\"upload\",\"oid\":\"abc123\",\"size\":10,\"path\":\"/tmp/f\"}\n",
            "{\"event\":\"download\",\"oid\":\"def456\",\"size\":20}\n",
            "{\"event\":\"terminate\"}\n",
        );
        run(&mut a, input).unwrap();

        let out = output(a);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], serde_json::json!({}));
        assert_eq!(
            out[1],
            serde_json::json!({"event": "complete", "oid": "abc123"})
        );
        assert_eq!(out[2]["event"], "complete");
        assert_eq!(out[2]["oid"], "def456");
        assert!(out[2].get("error").is_none());
        let path = out[2]["path"].as_str().unwrap();
        assert!(Path::new(path).exists());
        assert_eq!(log_lines(tmp.path()), 0);
    }

    #[test]
    fn failures_are_reported_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = agent(tmp.path(), CopyCommand::new("false"));
        let input = concat!(
            "{\"event\":\"download\",\"oid\":\"def456\",\"size\":20}\n",
            "{\"event\":\"upload\",\"oid\":\"abc123\",\"size\":10,\"path\":\"/tmp/f\"}\n",
            "{\"event\":\"init\"}\n",
        );
        run(&mut a, input).unwrap();

        assert_eq!(
            output(a),
            [
                serde_json::json!({
                    "event": "complete",
                    "oid": "def456",
                    "error": {"code": 1, "message": "Download failed"},
                }),
                serde_json::json!({
                    "event": "complete",
                    "oid": "abc123",
                    "error": {"code": 1, "message": "Upload failed"},
                }),
                serde_json::json!({}),
            ]
        );
        assert_eq!(log_lines(tmp.path()), 2);
    }

    #[test]
    fn terminate_stops_reading() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = agent(tmp.path(), CopyCommand::new("true"));
        // The garbage after terminate must never be decoded.
        run(&mut a, "{\"event\":\"terminate\"}\nnot json\n{\"event\":\"init\"}\n").unwrap();

        assert!(output(a).is_empty());
    }

    #[test]
    fn eof_ends_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = agent(tmp.path(), CopyCommand::new("true"));
        run(&mut a, "").unwrap();
        assert!(output(a).is_empty());
    }

    #[test]
    fn malformed_line_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = agent(tmp.path(), CopyCommand::new("true"));
        let input = "{\"event\":\"init\"}\n{\"event\":\"resume\"}\n{\"event\":\"init\"}\n";

        let err = run(&mut a, input).unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
        // Only the first init was answered.
        assert_eq!(output(a), [serde_json::json!({})]);
    }
}
