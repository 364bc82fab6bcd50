//! Protocol message types for host↔agent communication.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Longest object id accepted from the host.
///
/// git-lfs object ids are 64 hex characters (SHA-256); the limit leaves
/// headroom for other hash algorithms.
pub const MAX_OID_LEN: usize = 128;

/// Event sent from git-lfs to the transfer agent.
///
/// Decoding fails on malformed JSON, an unknown `event` tag, or an
/// `upload`/`download` whose `oid` is not 1..=[`MAX_OID_LEN`] hex digits.
/// All three are fatal protocol errors for the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    /// Handshake; the agent must answer with an empty object.
    Init(Init),
    /// Shutdown request. No response is expected.
    Terminate,
    /// Copy a local file to the remote store.
    Upload(Upload),
    /// Fetch an object from the remote store into a local file.
    Download(Download),
}

impl Event {
    /// Protocol name of the event, as sent in the `event` field.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Terminate => "terminate",
            Self::Upload(_) => "upload",
            Self::Download(_) => "download",
        }
    }
}

/// Payload of the `init` event.
///
/// The agent does not act on any of these; they are decoded for tracing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Init {
    /// `"upload"` or `"download"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Name of the git remote in use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    /// Whether git-lfs runs several agent processes concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent: Option<bool>,
    /// Number of concurrent agent processes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrenttransfers: Option<u32>,
}

/// Payload of the `upload` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    /// Object id (content hash).
    #[serde(deserialize_with = "oid")]
    pub oid: String,
    /// Object size in bytes.
    pub size: u64,
    /// Local file holding the object contents.
    pub path: String,
    /// Opaque transfer action from the LFS API, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
    /// Fields this agent does not interpret, kept so the request can be
    /// logged as received.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Payload of the `download` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Object id (content hash).
    #[serde(deserialize_with = "oid")]
    pub oid: String,
    /// Object size in bytes.
    pub size: u64,
    /// Opaque transfer action from the LFS API, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
    /// Fields this agent does not interpret, kept so the request can be
    /// logged as received.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Rejects object ids that could address anything other than a single
/// file directly under the remote prefix.
fn oid<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let oid = String::deserialize(d)?;
    if oid.is_empty() || oid.len() > MAX_OID_LEN {
        return Err(D::Error::custom(format!(
            "oid must be 1..={MAX_OID_LEN} characters, got {}",
            oid.len()
        )));
    }
    if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(D::Error::custom(format!("oid {oid:?} is not hexadecimal")));
    }
    Ok(oid)
}

/// Response sent from the agent to git-lfs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Response {
    /// Acknowledges `init`; serialized as `{}`.
    Init(InitAck),
    /// Result of one upload or download.
    Complete(Complete),
}

/// Empty acknowledgement of the `init` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitAck {}

/// `complete` event reporting the outcome of a single transfer.
///
/// A successful download carries `path`; a failure carries `error`; a
/// successful upload carries neither. The constructors are the only way to
/// build one, so `path` and `error` never appear together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename = "complete")]
pub struct Complete {
    /// Echo of the request's object id.
    oid: String,
    /// Downloaded file.
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    /// Failure details.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<TransferError>,
}

impl Complete {
    /// An upload finished.
    pub fn uploaded(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            path: None,
            error: None,
        }
    }

    /// A download finished; the object is now at `path`.
    pub fn downloaded(oid: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            path: Some(path.into()),
            error: None,
        }
    }

    /// The transfer failed.
    pub fn failed(oid: impl Into<String>, error: TransferError) -> Self {
        Self {
            oid: oid.into(),
            path: None,
            error: Some(error),
        }
    }

    /// Object id this response answers.
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Local path of a downloaded object.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Failure details, if the transfer failed.
    pub const fn error(&self) -> Option<&TransferError> {
        self.error.as_ref()
    }
}

impl From<Complete> for Response {
    fn from(c: Complete) -> Self {
        Self::Complete(c)
    }
}

/// Error object embedded in a failed `complete` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferError {
    /// Error code; always `1` for this agent.
    pub code: i32,
    /// Short human-readable message.
    pub message: String,
}

impl TransferError {
    /// Generic failure of an upload.
    pub fn upload_failed() -> Self {
        Self {
            code: 1,
            message: "Upload failed".into(),
        }
    }

    /// Generic failure of a download.
    pub fn download_failed() -> Self {
        Self {
            code: 1,
            message: "Download failed".into(),
        }
    }
}
