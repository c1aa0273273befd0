//! Streaming HTTP/1.1 message reader
//!
//! [`MessageReader`] pulls bytes from an [`AsyncRead`] into a [`LineBuffer`] and rebuilds one
//! message from them: the start line, the ordered header pairs and the body, framed either
//! by `content-length` or by chunked transfer encoding.
//!
//! # State Machine
//!
//! ```text
//! StartLine -> Headers -> Body(Empty | Length(n) | Chunked) -> Done
//! ```
//!
//! Every unit of work (a line, an exact read) first checks the cancellation token and the
//! deadline of the [`ReadOptions`]; every raw read is additionally bounded by the deadline.
//! A read already waiting on the transport is not interrupted by the token, only by the
//! deadline. Any error aborts the whole message, nothing partial is returned.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use micro_h1::codec::{MessageReader, ReadOptions};
//! use tokio::net::TcpStream;
//!
//! # async fn run(mut stream: TcpStream) -> Result<(), micro_h1::protocol::ParseError> {
//! let options = ReadOptions::with_timeout(Duration::from_secs(10));
//! let message = MessageReader::new(&mut stream, options).read().await?;
//! println!("{} ({} headers)", message.start_line, message.headers.len());
//! # Ok(())
//! # }
//! ```

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncRead;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::codec::body::parse_chunk_size;
use crate::codec::header::{Framing, HeaderLine};
use crate::codec::line_buffer::LineBuffer;
use crate::protocol::{Headers, ParseError, RawMessage, TransferMode};
use crate::{deadline_after, ensure};

/// Longest line accepted before giving up on finding its CRLF
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Per read operation limits: an absolute deadline and a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl ReadOptions {
    /// No deadline and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now, a zero timeout means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: deadline_after(timeout), cancel: None }
    }

    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn check(&self) -> Result<(), ParseError> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(ParseError::Canceled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ParseError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    StartLine,
    Headers,
    Body(TransferMode),
    Done,
}

/// Reads messages off one stream.
///
/// Bytes received past the end of a message stay buffered for the next [`read_next`](Self::read_next)
/// call on the same reader.
#[derive(Debug)]
pub struct MessageReader<'io, R> {
    io: &'io mut R,
    buffer: LineBuffer,
    options: ReadOptions,
    state: ReadState,
    read_time: Duration,
}

impl<'io, R> MessageReader<'io, R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(io: &'io mut R, options: ReadOptions) -> Self {
        Self { io, buffer: LineBuffer::new(), options, state: ReadState::StartLine, read_time: Duration::ZERO }
    }

    /// Replaces the limits applied to the following reads.
    pub fn set_options(&mut self, options: ReadOptions) {
        self.options = options;
    }

    /// Reads a single message.
    pub async fn read(mut self) -> Result<RawMessage, ParseError> {
        self.read_next().await
    }

    /// Drives the state machine until the next message is complete.
    pub async fn read_next(&mut self) -> Result<RawMessage, ParseError> {
        self.state = ReadState::StartLine;
        self.read_time = Duration::ZERO;

        let mut start_line = String::new();
        let mut headers = Headers::with_capacity(16);
        let mut framing = Framing::default();
        let mut body = None;

        loop {
            self.state = match self.state {
                ReadState::StartLine => {
                    let line = match self.next_line().await {
                        Err(ParseError::Io { source })
                            if source.kind() == io::ErrorKind::UnexpectedEof && self.buffer.is_empty() =>
                        {
                            return Err(ParseError::Closed);
                        }
                        line => line?,
                    };
                    if line.is_empty() {
                        trace!("skip empty line before start line");
                        continue;
                    }
                    start_line = String::from_utf8_lossy(&line).into_owned();
                    ReadState::Headers
                }

                ReadState::Headers => {
                    let line = self.next_line().await?;
                    if line.is_empty() {
                        ReadState::Body(framing.mode)
                    } else {
                        let line = String::from_utf8_lossy(&line);
                        match HeaderLine::parse(&line) {
                            Some(header) => {
                                framing.observe(&header);
                                headers.add(header.name, header.value);
                            }
                            None => debug!(line = %line, "skip header line without colon"),
                        }
                        ReadState::Headers
                    }
                }

                ReadState::Body(mode) => {
                    body = match mode {
                        TransferMode::Length(0) | TransferMode::Empty => None,
                        TransferMode::Length(length) => Some(self.read_length(length).await?),
                        TransferMode::Chunked => Some(self.read_chunked(&framing.trailers).await?),
                    };
                    ReadState::Done
                }

                ReadState::Done => break,
            };
        }

        trace!(
            start_line = %start_line,
            headers = headers.len(),
            body = body.as_ref().map(Bytes::len),
            read_time = ?self.read_time,
            "finished reading message"
        );
        Ok(RawMessage { start_line, headers, body, read_time: self.read_time })
    }

    async fn read_length(&mut self, length: u64) -> Result<Bytes, ParseError> {
        let length = usize::try_from(length)
            .map_err(|_e| ParseError::invalid_body(format!("content-length {length} does not fit in memory")))?;
        self.take_exact(length).await
    }

    async fn read_chunked(&mut self, trailers: &[String]) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();
        loop {
            let line = self.next_line().await?;
            if line.is_empty() {
                trace!("skip empty chunk size line");
                continue;
            }

            let size = parse_chunk_size(&line)?;
            if size == 0 {
                ensure!(trailers.is_empty(), ParseError::unsupported_trailer_headers(trailers.to_vec()));

                let last = self.next_line().await?;
                if !last.is_empty() {
                    let last = String::from_utf8_lossy(&last);
                    let name = HeaderLine::parse(&last).map_or_else(|| last.to_string(), |header| header.name);
                    return Err(ParseError::unsupported_trailer_headers(vec![name]));
                }

                trace!(len = body.len(), "finished reading chunked body");
                return Ok(body.freeze());
            }

            let size = usize::try_from(size)
                .ok()
                .filter(|size| *size < usize::MAX - 1)
                .ok_or_else(|| ParseError::invalid_chunk_size(format!("chunk size {size} does not fit in memory")))?;

            let chunk = self.take_exact(size + 2).await?;
            ensure!(chunk.ends_with(b"\r\n"), ParseError::invalid_body("missing CRLF after chunk data"));
            trace!(len = size, "read chunk");
            body.extend_from_slice(&chunk[..size]);
        }
    }

    async fn next_line(&mut self) -> Result<Bytes, ParseError> {
        loop {
            self.options.check()?;
            if let Some(line) = self.buffer.take_line() {
                return Ok(line);
            }

            ensure!(self.buffer.len() < MAX_LINE_BYTES, ParseError::too_large_line(self.buffer.len(), MAX_LINE_BYTES));

            let fill = self.buffer.fill(&mut *self.io);
            bounded(self.options.deadline, &mut self.read_time, fill).await?;
        }
    }

    async fn take_exact(&mut self, n: usize) -> Result<Bytes, ParseError> {
        self.options.check()?;
        if let Some(bytes) = self.buffer.take_exact(n) {
            return Ok(bytes);
        }

        let fill = self.buffer.fill_exact(&mut *self.io, n);
        bounded(self.options.deadline, &mut self.read_time, fill).await?;

        self.buffer.take_exact(n).ok_or_else(|| ParseError::invalid_body("short read of exact bytes"))
    }
}

/// Awaits a raw read, bounded by `deadline`, and adds the time spent to `read_time`.
async fn bounded<F, T>(deadline: Option<Instant>, read_time: &mut Duration, read: F) -> Result<T, ParseError>
where
    F: Future<Output = io::Result<T>>,
{
    let started = Instant::now();
    let result = match deadline {
        Some(deadline) => timeout_at(deadline, read).await.map_err(|_elapsed| ParseError::DeadlineExceeded),
        None => Ok(read.await),
    };
    *read_time += started.elapsed();
    result?.map_err(ParseError::io)
}
