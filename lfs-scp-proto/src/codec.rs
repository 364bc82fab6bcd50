//! Newline-delimited JSON codec over any `BufRead`/`Write` stream.
//!
//! Each message is one JSON object followed by `\n`.

use std::io::{self, BufRead, Read, Write};

use crate::{Event, Response};

/// Maximum accepted input line (1 MiB).
pub const MAX_LINE: usize = 1024 * 1024;

/// Reads one line from `r` and decodes it as an [`Event`].
///
/// Returns `Ok(None)` at end of input. Malformed JSON, an unknown `event`
/// tag, or a line longer than [`MAX_LINE`] yields an error of kind
/// [`io::ErrorKind::InvalidData`].
pub fn read_event(r: &mut impl BufRead) -> io::Result<Option<Event>> {
    let mut line = String::new();
    let limit = u64::try_from(MAX_LINE + 1).unwrap_or(u64::MAX);
    let n = r.by_ref().take(limit).read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if line.len() > MAX_LINE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "input line exceeds 1 MiB limit",
        ));
    }
    serde_json::from_str(line.trim_end_matches(['\n', '\r']))
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Encodes `msg` as a single JSON line, writes it to `w`, and flushes.
pub fn write_response<W: Write>(w: &mut W, msg: &Response) -> io::Result<()> {
    let mut line =
        serde_json::to_vec(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    line.push(b'\n');
    w.write_all(&line)?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Complete, InitAck, TransferError};

    #[test]
    fn reads_events_in_order_then_eof() {
        let input = b"{\"event\":\"init\"}\n{\"event\":\"download\",\"oid\":\"def456\",\"size\":20}\r\n{\"event\":\"terminate\"}";
        let mut cursor = io::Cursor::new(&input[..]);

        assert!(matches!(read_event(&mut cursor).unwrap(), Some(Event::Init(_))));
        match read_event(&mut cursor).unwrap() {
            Some(Event::Download(d)) => assert_eq!(d.oid, "def456"),
            other => panic!("expected Download, got {other:?}"),
        }
        assert!(matches!(read_event(&mut cursor).unwrap(), Some(Event::Terminate)));
        assert!(read_event(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn malformed_line_is_invalid_data() {
        let mut cursor = io::Cursor::new(&b"not json\n"[..]);
        let err = read_event(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut cursor = io::Cursor::new(&b"{\"event\":\"bogus\"}\n"[..]);
        let err = read_event(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn rejects_oversized_line() {
        let mut input = vec![b' '; MAX_LINE + 10];
        input.push(b'\n');
        let mut cursor = io::Cursor::new(input);
        let err = read_event(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn writes_one_line_per_response() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::Init(InitAck {})).unwrap();
        write_response(&mut out, &Complete::uploaded("abc123").into()).unwrap();
        write_response(
            &mut out,
            &Complete::failed("abc123", TransferError::upload_failed()).into(),
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "{}",
                r#"{"event":"complete","oid":"abc123"}"#,
                r#"{"event":"complete","oid":"abc123","error":{"code":1,"message":"Upload failed"}}"#,
            ]
        );
    }
}
