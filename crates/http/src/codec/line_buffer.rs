//! Growable input buffer with CRLF line framing.
//!
//! [`LineBuffer`] owns the bytes that have been read from the transport but not yet consumed
//! by the message reader. Consumption hands out frozen [`Bytes`] split off the front of the
//! buffer, so no already buffered byte is copied again.

use std::cmp;
use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use memchr::memmem;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

/// Number of bytes requested from the transport per read while scanning for a line
pub const LINE_READ_CHUNK: usize = 1024;

/// Largest amount of memory reserved at once while reading an exact number of bytes
const EXACT_RESERVE_LIMIT: usize = 1024 * 1024;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: BytesMut,
    /// Prefix of `pending` already known to contain no CRLF
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered bytes not consumed yet.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Takes the bytes before the first CRLF and drops the CRLF itself.
    ///
    /// Returns `None` when no complete line is buffered yet.
    pub fn take_line(&mut self) -> Option<Bytes> {
        // a CR at the very end of the scanned prefix may pair with a LF read later
        let from = self.scanned.saturating_sub(1);
        match memmem::find(&self.pending[from..], CRLF) {
            Some(offset) => {
                let line = self.pending.split_to(from + offset).freeze();
                self.pending.advance(CRLF.len());
                self.scanned = 0;
                Some(line)
            }
            None => {
                self.scanned = self.pending.len();
                None
            }
        }
    }

    /// Takes exactly `n` bytes, or returns `None` when fewer are buffered.
    pub fn take_exact(&mut self, n: usize) -> Option<Bytes> {
        if self.pending.len() < n {
            return None;
        }
        self.scanned = self.scanned.saturating_sub(n);
        Some(self.pending.split_to(n).freeze())
    }

    /// Issues one read from `io`, appending at most [`LINE_READ_CHUNK`] bytes.
    ///
    /// A read of zero bytes means the peer closed the stream and is reported as
    /// [`io::ErrorKind::UnexpectedEof`].
    pub async fn fill<R>(&mut self, io: &mut R) -> io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        self.pending.reserve(LINE_READ_CHUNK);
        let n = io.read_buf(&mut (&mut self.pending).limit(LINE_READ_CHUNK)).await?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        trace!(read = n, buffered = self.pending.len(), "filled line buffer");
        Ok(n)
    }

    /// Reads until at least `n` bytes are buffered, asking the transport only for the
    /// shortfall.
    pub async fn fill_exact<R>(&mut self, io: &mut R, n: usize) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        while self.pending.len() < n {
            let shortfall = n - self.pending.len();
            self.pending.reserve(cmp::min(shortfall, EXACT_RESERVE_LIMIT));
            let read = io.read_buf(&mut (&mut self.pending).limit(shortfall)).await?;
            if read == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            trace!(read, shortfall, "filled exact bytes");
        }
        Ok(())
    }
}

impl From<&[u8]> for LineBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self { pending: BytesMut::from(bytes), scanned: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_line_splits_on_crlf() {
        let mut buffer = LineBuffer::from(&b"GET / HTTP/1.1\r\nhost: a\r\n\r\nrest"[..]);

        assert_eq!(buffer.take_line().unwrap(), &b"GET / HTTP/1.1"[..]);
        assert_eq!(buffer.take_line().unwrap(), &b"host: a"[..]);
        assert_eq!(buffer.take_line().unwrap(), &b""[..]);
        assert_eq!(buffer.take_line(), None);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn bare_lf_is_not_a_line_end() {
        let mut buffer = LineBuffer::from(&b"a\nb"[..]);
        assert_eq!(buffer.take_line(), None);
    }

    #[tokio::test]
    async fn crlf_split_across_reads() {
        let mut buffer = LineBuffer::from(&b"abc\r"[..]);
        assert_eq!(buffer.take_line(), None);

        let mut io = &b"\ndef"[..];
        buffer.fill(&mut io).await.unwrap();
        assert_eq!(buffer.take_line().unwrap(), &b"abc"[..]);
        assert_eq!(buffer.take_exact(3).unwrap(), &b"def"[..]);
    }

    #[test]
    fn take_exact_waits_for_enough_bytes() {
        let mut buffer = LineBuffer::from(&b"hello"[..]);
        assert_eq!(buffer.take_exact(6), None);
        assert_eq!(buffer.take_exact(5).unwrap(), &b"hello"[..]);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn fill_reads_at_most_one_chunk() {
        let data = vec![b'x'; LINE_READ_CHUNK * 3];
        let mut io = &data[..];
        let mut buffer = LineBuffer::new();

        let n = buffer.fill(&mut io).await.unwrap();
        assert_eq!(n, LINE_READ_CHUNK);
        assert_eq!(buffer.len(), LINE_READ_CHUNK);
    }

    #[tokio::test]
    async fn fill_exact_reads_only_the_shortfall() {
        let mut buffer = LineBuffer::from(&b"12"[..]);
        let mut io = &b"345678"[..];

        buffer.fill_exact(&mut io, 5).await.unwrap();
        assert_eq!(buffer.len(), 5);
        assert_eq!(io, &b"678"[..]);
    }

    #[tokio::test]
    async fn closed_stream_is_unexpected_eof() {
        let mut buffer = LineBuffer::new();
        let mut io = &b""[..];

        let error = buffer.fill(&mut io).await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);

        let error = buffer.fill_exact(&mut io, 3).await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }
}
