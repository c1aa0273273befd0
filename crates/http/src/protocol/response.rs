//! HTTP response model.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::codec::{MessageReader, ReadOptions, encode_message};
use crate::connection::MessageWriter;
use crate::protocol::names::{CONTENT_ENCODING, TRANSFER_ENCODING};
use crate::protocol::{ContentDecoder, DecodeError, Headers, OutgoingMessage, ParseError, RawMessage, SendError};

/// An HTTP response.
///
/// Equality compares the response content only, `read_time` is ignored.
#[derive(Debug, Clone, Eq)]
pub struct Response {
    status: StatusCode,
    status_text: String,
    headers: Headers,
    body: Option<Bytes>,
    read_time: Duration,
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.status_text == other.status_text
            && self.headers == other.headers
            && self.body == other.body
    }
}

impl Default for Response {
    /// An empty `200 OK` response.
    fn default() -> Self {
        Self::with_status(StatusCode::OK)
    }
}

impl Response {
    /// An empty response with the given status and reason text.
    pub fn new<T: Into<String>>(status: StatusCode, text: T) -> Self {
        Self { status, status_text: text.into(), headers: Headers::new(), body: None, read_time: Duration::ZERO }
    }

    /// An empty response carrying the canonical reason phrase of `status`.
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or_default())
    }

    /// Reads one response from `io`.
    ///
    /// `transfer-encoding` is removed from the headers once the body is assembled, since the
    /// returned body is no longer chunked.
    pub async fn read<R>(io: &mut R, options: ReadOptions) -> Result<Self, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut response: Self = MessageReader::new(io, options).read().await?.try_into()?;
        response.headers.delete(TRANSFER_ENCODING);
        Ok(response)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn set_status<T: Into<String>>(&mut self, status: StatusCode, text: T) -> &mut Self {
        self.status = status;
        self.status_text = text.into();
        self
    }

    /// `HTTP/1.1 <code> <text>`, without the trailing space when the text is empty.
    pub fn start_line(&self) -> String {
        if self.status_text.is_empty() {
            format!("HTTP/1.1 {}", self.status.as_u16())
        } else {
            format!("HTTP/1.1 {} {}", self.status.as_u16(), self.status_text)
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn add_header<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        self.headers.add(name, value);
        self
    }

    pub fn set_header<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    pub fn delete_header(&mut self, name: &str) -> &mut Self {
        self.headers.delete(name);
        self
    }

    /// First value of `name`, which must be given in lowercase.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn set_body<B: Into<Bytes>>(&mut self, body: B) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Time spent in transport reads while this response was received.
    pub fn read_time(&self) -> Duration {
        self.read_time
    }

    /// Undoes the `content-encoding` of the body, last applied coding first.
    ///
    /// Only the body is replaced; the `content-encoding` header is left as received.
    pub fn decode_content<D>(&mut self, decoder: &D) -> Result<(), DecodeError>
    where
        D: ContentDecoder + ?Sized,
    {
        let Some(mut body) = self.body.clone() else {
            return Ok(());
        };

        let codings: Vec<String> = self
            .headers
            .get_all(CONTENT_ENCODING)
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(|coding| coding.trim().to_ascii_lowercase())
            .filter(|coding| !coding.is_empty())
            .collect();

        for coding in codings.iter().rev() {
            debug!(coding, len = body.len(), "decoding body");
            body = decoder.decode(coding, body)?;
        }
        self.body = Some(body);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Bytes, SendError> {
        let start_line = self.start_line();
        encode_message(self.outgoing(&start_line))
    }

    /// Writes the response to `io` within `timeout`, zero waits forever.
    pub async fn write<W>(&self, io: &mut W, timeout: Duration) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin,
    {
        let start_line = self.start_line();
        MessageWriter::new(io).send(self.outgoing(&start_line), timeout).await
    }

    pub(crate) fn outgoing<'a>(&'a self, start_line: &'a str) -> OutgoingMessage<'a> {
        OutgoingMessage::new(start_line, &self.headers, self.body.as_deref())
    }
}

impl TryFrom<RawMessage> for Response {
    type Error = ParseError;

    /// Splits the status line into protocol version, code and reason text.
    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let mut parts = raw.start_line.splitn(3, ' ');
        let _version = parts.next();
        let status = parts
            .next()
            .and_then(|code| StatusCode::from_bytes(code.as_bytes()).ok())
            .ok_or_else(|| ParseError::invalid_status_code(&raw.start_line))?;
        let status_text = parts.next().unwrap_or_default().to_string();

        Ok(Self { status, status_text, headers: raw.headers, body: raw.body, read_time: raw.read_time })
    }
}

impl fmt::Display for Response {
    /// The wire form of the response.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bytes() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(_e) => Ok(()),
        }
    }
}
