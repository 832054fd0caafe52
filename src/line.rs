//! Incoming line framer.
//!
//! Reassembles raw transport bytes into `\r\n`- or `\n`-terminated lines
//! using a single fixed-size buffer. The wire maximum is 512 bytes per
//! message; the buffer is four times that so TCP fragmentation never
//! straddles a refill in practice.

use crate::error::{Error, Result};

/// Size of the reassembly buffer.
pub const LINE_BUFFER_LEN: usize = 2048;

/// Fixed-capacity buffer that splits a byte stream into IRC lines.
///
/// Bytes are appended at a cursor; complete lines are handed to a callback
/// with terminators stripped, and any residual partial line is compacted to
/// the buffer head. Consecutive terminators collapse (empty lines are
/// skipped).
pub struct LineBuffer {
    buf: Box<[u8; LINE_BUFFER_LEN]>,
    /// Number of buffered bytes.
    len: usize,
    /// Index up to which the buffer has already been scanned for a
    /// terminator, so refills never rescan old bytes.
    scanned: usize,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: Box::new([0u8; LINE_BUFFER_LEN]),
            len: 0,
            scanned: 0,
        }
    }

    /// Number of bytes currently buffered (incomplete line residue).
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Discard any buffered bytes.
    pub fn clear(&mut self) {
        self.len = 0;
        self.scanned = 0;
    }

    /// Append a chunk of bytes and invoke `on_line` for each complete line.
    ///
    /// Lines are passed without their terminators. Fails with
    /// [`Error::BufferOverflow`] if the buffer fills up without any
    /// terminator in sight (an oversize line is a protocol violation).
    /// Errors from the callback abort the feed and propagate; the offending
    /// line is consumed.
    pub fn feed<F>(&mut self, mut chunk: &[u8], mut on_line: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        while !chunk.is_empty() {
            let space = LINE_BUFFER_LEN - self.len;
            if space == 0 {
                return Err(Error::BufferOverflow);
            }

            let take = space.min(chunk.len());
            self.buf[self.len..self.len + take].copy_from_slice(&chunk[..take]);
            self.len += take;
            chunk = &chunk[take..];

            self.drain_lines(&mut on_line)?;

            if self.len == LINE_BUFFER_LEN {
                // A full buffer after draining means no terminator exists.
                return Err(Error::BufferOverflow);
            }
        }
        Ok(())
    }

    /// Scan for terminators, dispatch complete lines, compact the residue.
    fn drain_lines<F>(&mut self, on_line: &mut F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut start = 0;
        let mut pos = self.scanned;

        while pos < self.len {
            let b = self.buf[pos];
            if b == b'\r' || b == b'\n' {
                if pos > start {
                    let result = on_line(&self.buf[start..pos]);
                    if let Err(e) = result {
                        // Drop everything through the terminator before
                        // surfacing the error, so the stream stays framed.
                        // The residue past the terminator is unscanned.
                        self.compact(pos + 1);
                        self.scanned = 0;
                        return Err(e);
                    }
                }
                start = pos + 1;
            }
            pos += 1;
        }

        self.compact(start);
        Ok(())
    }

    /// Move the unconsumed tail to the buffer head.
    fn compact(&mut self, consumed: usize) {
        if consumed > 0 {
            self.buf.copy_within(consumed..self.len, 0);
            self.len -= consumed;
        }
        self.scanned = self.len;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(buf: &mut LineBuffer, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        buf.feed(chunk, |l| {
            lines.push(String::from_utf8(l.to_vec()).unwrap());
            Ok(())
        })
        .unwrap();
        lines
    }

    #[test]
    fn test_single_line() {
        let mut buf = LineBuffer::new();
        assert_eq!(collect(&mut buf, b"PING :x\r\n"), vec!["PING :x"]);
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut buf = LineBuffer::new();
        assert!(collect(&mut buf, b"PING :one").is_empty());
        assert_eq!(buf.pending(), 9);
        assert_eq!(
            collect(&mut buf, b"two\r\nNOTICE x :y\r\n"),
            vec!["PING :onetwo", "NOTICE x :y"]
        );
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn test_bare_lf_and_collapsed_terminators() {
        let mut buf = LineBuffer::new();
        assert_eq!(
            collect(&mut buf, b"a\nb\r\n\r\n\nc\n"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_residue_compaction() {
        let mut buf = LineBuffer::new();
        assert_eq!(collect(&mut buf, b"one\r\npart"), vec!["one"]);
        assert_eq!(buf.pending(), 4);
        assert_eq!(collect(&mut buf, b"ial\r\n"), vec!["partial"]);
    }

    #[test]
    fn test_overflow_without_terminator() {
        let mut buf = LineBuffer::new();
        let big = vec![b'x'; LINE_BUFFER_LEN + 1];
        let err = buf.feed(&big, |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::BufferOverflow));
    }

    #[test]
    fn test_callback_error_consumes_line() {
        let mut buf = LineBuffer::new();
        let err = buf
            .feed(b"bad\r\ngood\r\n", |l| {
                if l == b"bad" {
                    Err(Error::NotConnected)
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        // The good line is still buffered and comes out on the next feed.
        assert_eq!(collect(&mut buf, b""), Vec::<String>::new());
        let mut lines = Vec::new();
        buf.feed(b"\n", |l| {
            lines.push(String::from_utf8(l.to_vec()).unwrap());
            Ok(())
        })
        .unwrap();
        assert_eq!(lines, vec!["good"]);
    }
}
