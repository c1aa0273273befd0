use std::time::Duration;

use bytes::Bytes;

use crate::protocol::Headers;

/// A message exactly as the reader reconstructed it from the wire.
///
/// `body` is `None` when the message signaled no body at all, which is different from
/// `Some` of an empty buffer (for example a chunked body made of the last chunk only).
///
/// Equality compares the message content only, `read_time` is ignored.
#[derive(Debug, Clone, Eq)]
pub struct RawMessage {
    pub start_line: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    /// Time spent waiting inside raw transport reads while this message was read.
    pub read_time: Duration,
}

impl PartialEq for RawMessage {
    fn eq(&self, other: &Self) -> bool {
        self.start_line == other.start_line && self.headers == other.headers && self.body == other.body
    }
}

/// A message ready to be rendered into wire bytes.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingMessage<'a> {
    pub start_line: &'a str,
    pub headers: &'a Headers,
    pub body: Option<&'a [u8]>,
}

impl<'a> OutgoingMessage<'a> {
    pub fn new(start_line: &'a str, headers: &'a Headers, body: Option<&'a [u8]>) -> Self {
        Self { start_line, headers, body }
    }

    /// The body when it has at least one byte.
    #[inline]
    pub fn payload(&self) -> Option<&'a [u8]> {
        self.body.filter(|body| !body.is_empty())
    }
}

/// How the body of an inbound message is framed.
///
/// Derived from the header block while it is read, never stored on a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// No body was signaled
    #[default]
    Empty,
    /// Body with a `content-length` in bytes
    Length(u64),
    /// Body using chunked transfer encoding
    Chunked,
}
