//! Line framing over the raw byte stream.
//!
//! [`LineBuffer`] accumulates arbitrary byte chunks and yields complete
//! `\r\n`-terminated lines with the terminator stripped; a trailing partial
//! line stays buffered for the next chunk. [`LineCodec`] adapts the same
//! splitting to `tokio_util`'s codec traits for use with `Framed`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Accumulates received bytes and splits them into complete protocol lines.
///
/// The framer imposes no maximum line length; the transport layer may cap
/// packet size, the buffer simply grows until a terminator arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
    /// Index of next byte to check for a newline.
    next_index: usize,
}

impl LineBuffer {
    /// Create an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly received chunk to the internal buffer.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete line, if any, with the terminator stripped.
    ///
    /// Splits on `\n`; a preceding `\r` is also stripped, so a `\r\n`
    /// terminator arriving split across two chunks still frames correctly.
    /// Non-UTF-8 bytes are decoded lossily.
    pub fn next_line(&mut self) -> Option<String> {
        let offset = match self.buf[self.next_index..].iter().position(|b| *b == b'\n') {
            Some(offset) => offset,
            None => {
                self.mark_scanned();
                return None;
            }
        };

        let mut line = self.buf.split_to(self.next_index + offset + 1);
        self.next_index = 0;

        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Drain every complete line currently buffered.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { buf: self }
    }

    /// Number of buffered bytes not yet framed into a line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Remember where scanning stopped so the next call skips bytes already
    /// checked for a terminator.
    fn mark_scanned(&mut self) {
        self.next_index = self.buf.len();
    }
}

/// Draining iterator over the complete lines in a [`LineBuffer`].
#[derive(Debug)]
pub struct Lines<'a> {
    buf: &'a mut LineBuffer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.next_line()
    }
}

/// Codec adapter: one decoded item per complete line, encoder appends `\r\n`.
#[derive(Debug, Default)]
pub struct LineCodec {
    inner: LineBuffer,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // Framed owns the read buffer; hand its contents to our own.
        self.inner.extend(&src.split_to(src.len()));
        let line = self.inner.next_line();
        if line.is_none() {
            self.inner.mark_scanned();
        }
        Ok(line)
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut buf = LineBuffer::new();
        buf.extend(b"PING :test\r\n");
        assert_eq!(buf.next_line(), Some("PING :test".to_string()));
        assert_eq!(buf.next_line(), None);
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn test_partial_line_retained() {
        let mut buf = LineBuffer::new();
        buf.extend(b"PING :te");
        assert_eq!(buf.next_line(), None);
        buf.extend(b"st\r\n");
        assert_eq!(buf.next_line(), Some("PING :test".to_string()));
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut buf = LineBuffer::new();
        buf.extend(b"NICK a\r\nUSER b\r\nJOIN #c\r\n");
        let lines: Vec<_> = buf.lines().collect();
        assert_eq!(lines, vec!["NICK a", "USER b", "JOIN #c"]);
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut buf = LineBuffer::new();
        buf.extend(b"QUIT\r");
        assert_eq!(buf.next_line(), None);
        buf.extend(b"\n");
        assert_eq!(buf.next_line(), Some("QUIT".to_string()));
    }

    #[test]
    fn test_chunk_boundary_independence() {
        let stream = b":nick!u@h PRIVMSG #chan :hello world\r\nPING :abc\r\n:srv 353 me = #chan :@op +v plain\r\n";

        let mut whole = LineBuffer::new();
        whole.extend(stream);
        let expected: Vec<_> = whole.lines().collect();

        for split in 0..stream.len() {
            let mut buf = LineBuffer::new();
            let mut got = Vec::new();
            buf.extend(&stream[..split]);
            got.extend(buf.lines());
            buf.extend(&stream[split..]);
            got.extend(buf.lines());
            assert_eq!(got, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_codec_decode_and_encode() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING :test\r\nPART"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PING :test".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        let mut out = BytesMut::new();
        codec.encode("PONG test".to_string(), &mut out).unwrap();
        assert_eq!(&out[..], b"PONG test\r\n");
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        let mut buf = LineBuffer::new();
        buf.extend(b"");
        assert_eq!(buf.next_line(), None);
    }
}
