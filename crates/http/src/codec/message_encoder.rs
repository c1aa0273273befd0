//! HTTP/1.1 message encoder
//!
//! Serializes an [`OutgoingMessage`] into wire bytes:
//!
//! ```text
//! <start-line>\r\n
//! (<name>: <value>\r\n)*
//! [content-length: <len>\r\n]
//! \r\n
//! [<body>]
//! ```
//!
//! Bodies are always sent with a computed `content-length`, never chunked. When a body is
//! present the caller's own `content-length` and `transfer-encoding` pairs are dropped so
//! the message carries exactly one framing header.

use std::io;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::names::{CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::protocol::{OutgoingMessage, SendError};

/// Initial buffer size allocated for the head of a message
const INIT_HEADER_SIZE: usize = 1024;

/// Encoder for whole HTTP messages implementing the [`Encoder`] trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageEncoder;

impl MessageEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<OutgoingMessage<'_>> for MessageEncoder {
    type Error = SendError;

    /// Encodes the message into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::EmptyStartLine`] if the start line is empty, nothing is written
    /// to `dst` in that case.
    fn encode(&mut self, item: OutgoingMessage<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        ensure!(!item.start_line.is_empty(), SendError::EmptyStartLine);

        let payload = item.payload();
        dst.reserve(INIT_HEADER_SIZE + payload.map_or(0, <[u8]>::len));

        dst.put_slice(item.start_line.as_bytes());
        dst.put_slice(b"\r\n");

        for (name, value) in item.headers.iter() {
            if payload.is_some() && is_framing_header(name) {
                trace!(name, "skip framing header, content-length is computed from the body");
                continue;
            }
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }

        match payload {
            Some(body) => {
                write!(FastWrite(dst), "{CONTENT_LENGTH}: {}\r\n\r\n", body.len())?;
                dst.put_slice(body);
            }
            None => dst.put_slice(b"\r\n"),
        }
        Ok(())
    }
}

/// Encodes `message` into a freshly allocated buffer.
pub fn encode_message(message: OutgoingMessage<'_>) -> Result<Bytes, SendError> {
    let mut dst = BytesMut::new();
    MessageEncoder.encode(message, &mut dst)?;
    Ok(dst.freeze())
}

fn is_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(CONTENT_LENGTH) || name.eq_ignore_ascii_case(TRANSFER_ENCODING)
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::codec::{MessageReader, ReadOptions};
    use crate::protocol::Headers;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().copied().collect()
    }

    fn encode(start_line: &str, headers: &Headers, body: Option<&[u8]>) -> Result<Bytes, SendError> {
        encode_message(OutgoingMessage::new(start_line, headers, body))
    }

    #[test]
    fn empty_start_line_is_rejected() {
        let mut dst = BytesMut::new();
        let result = MessageEncoder.encode(OutgoingMessage::new("", &Headers::new(), None), &mut dst);
        assert!(matches!(result, Err(SendError::EmptyStartLine)));
        assert!(dst.is_empty());
    }

    #[test]
    fn no_body() {
        let bytes = encode("GET /hi HTTP/1.1", &headers(&[("host", "a"), ("referer", "b")]), None).unwrap();
        assert_eq!(&bytes[..], b"GET /hi HTTP/1.1\r\nhost: a\r\nreferer: b\r\n\r\n");
    }

    #[test]
    fn empty_body_is_like_no_body() {
        let bytes = encode("HTTP/1.1 204 No Content", &Headers::new(), Some(&b""[..])).unwrap();
        assert_eq!(&bytes[..], b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn body_gets_computed_content_length() {
        let bytes = encode("HTTP/1.1 200 OK", &headers(&[("server", "micro")]), Some(&b"hello"[..])).unwrap();
        let expected = indoc! {"
        HTTP/1.1 200 OK\r
        server: micro\r
        content-length: 5\r
        \r
        hello"};
        assert_eq!(&bytes[..], expected.as_bytes());
    }

    #[test]
    fn caller_framing_headers_are_replaced() {
        let list = headers(&[("Content-Length", "99"), ("transfer-encoding", "chunked"), ("x", "1")]);
        let bytes = encode("HTTP/1.1 200 OK", &list, Some(&b"abc"[..])).unwrap();
        assert_eq!(&bytes[..], b"HTTP/1.1 200 OK\r\nx: 1\r\ncontent-length: 3\r\n\r\nabc");
    }

    #[test]
    fn caller_content_length_kept_without_body() {
        let bytes = encode("HEAD / HTTP/1.1", &headers(&[("content-length", "10")]), None).unwrap();
        assert_eq!(&bytes[..], b"HEAD / HTTP/1.1\r\ncontent-length: 10\r\n\r\n");
    }

    #[test]
    fn duplicates_keep_their_order() {
        let bytes = encode("HTTP/1.1 200 OK", &headers(&[("a", "1"), ("b", "2"), ("a", "3")]), None).unwrap();
        assert_eq!(&bytes[..], b"HTTP/1.1 200 OK\r\na: 1\r\nb: 2\r\na: 3\r\n\r\n");
    }

    #[tokio::test]
    async fn parse_after_serialize_appends_content_length() {
        let list = headers(&[("host", "example.com"), ("accept", "*/*"), ("accept", "text/plain")]);
        let bytes = encode("POST /upload HTTP/1.1", &list, Some(&b"payload"[..])).unwrap();

        let mut io = &bytes[..];
        let message = MessageReader::new(&mut io, ReadOptions::new()).read().await.unwrap();

        let mut expected = list.clone();
        expected.add("content-length", "7");
        assert_eq!(message.start_line, "POST /upload HTTP/1.1");
        assert_eq!(message.headers, expected);
        assert_eq!(message.body.unwrap(), &b"payload"[..]);
    }

    #[tokio::test]
    async fn no_body_stays_absent_after_parse() {
        let list = headers(&[("host", "example.com")]);
        let bytes = encode("GET / HTTP/1.1", &list, None).unwrap();

        let mut io = &bytes[..];
        let message = MessageReader::new(&mut io, ReadOptions::new()).read().await.unwrap();

        assert_eq!(message.body, None);
        assert!(!message.headers.contains("content-length"));
        assert_eq!(message.headers, list);
    }
}
