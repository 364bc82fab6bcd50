//! Git LFS custom transfer protocol.
//!
//! git-lfs talks to a standalone transfer agent over the agent's stdin and
//! stdout, one JSON object per line in each direction. The host sends one
//! event and blocks until it has read the matching response line.
//!
//! See <https://github.com/git-lfs/git-lfs/blob/main/docs/custom-transfers.md>.

mod codec;
mod message;

pub use codec::{MAX_LINE, read_event, write_response};
pub use message::{
    Complete, Download, Event, Init, InitAck, MAX_OID_LEN, Response, TransferError, Upload,
};
