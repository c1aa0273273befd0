//! HTTP request model.
//!
//! A [`Request`] owns a start line (method and URL), an ordered [`Headers`] list and an
//! optional body. Outbound requests are built with [`Request::new`] and sent with
//! [`Request::send`], inbound ones come from [`Request::read`].

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::uri::InvalidUri;
use http::{Method, Uri};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::codec::{MessageReader, ReadOptions, encode_message};
use crate::connection::MessageWriter;
use crate::ensure;
use crate::protocol::names::{HOST, X_REAL_IP};
use crate::protocol::{Headers, HttpError, OutgoingMessage, ParseError, RawMessage, Response, SendError};

/// Timeout applied to sending a request and awaiting its response unless changed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: Headers,
    body: Option<Bytes>,
    timeout: Duration,
    remote_addr: Option<SocketAddr>,
    read_time: Duration,
}

impl Request {
    /// Builds a request for `uri`, adding a `host` header when the URI names a host.
    pub fn new(method: Method, uri: &str) -> Result<Self, InvalidUri> {
        let uri: Uri = uri.parse()?;
        let mut headers = Headers::with_capacity(2);
        if let Some(host) = host_of(&uri) {
            headers.add(HOST, host);
        }
        Ok(Self {
            method,
            uri,
            headers,
            body: None,
            timeout: DEFAULT_TIMEOUT,
            remote_addr: None,
            read_time: Duration::ZERO,
        })
    }

    /// Reads one request from `io`.
    pub async fn read<R>(io: &mut R, options: ReadOptions) -> Result<Self, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        MessageReader::new(io, options).read().await?.try_into()
    }

    /// Copies method, headers and remote address under a new URI and timeout, the body is
    /// left behind.
    pub fn clone_with_uri(&self, uri: &str, timeout: Duration) -> Result<Self, InvalidUri> {
        Ok(Self {
            method: self.method.clone(),
            uri: uri.parse()?,
            headers: self.headers.clone(),
            body: None,
            timeout,
            remote_addr: self.remote_addr,
            read_time: Duration::ZERO,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path and query sent on the request line, `/` when the URI has none.
    pub fn request_target(&self) -> &str {
        self.uri.path_and_query().map_or("/", |pq| pq.as_str())
    }

    pub fn start_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.request_target())
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

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Client address: the `x-real-ip` header when a proxy set one, the peer address otherwise.
    pub fn remote_addr(&self) -> Option<String> {
        match self.header(X_REAL_IP) {
            Some(ip) if !ip.is_empty() => Some(ip.to_string()),
            _ => self.remote_addr.map(|addr| addr.to_string()),
        }
    }

    pub fn set_remote_addr(&mut self, addr: SocketAddr) -> &mut Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Time spent in transport reads while this request was received.
    pub fn read_time(&self) -> Duration {
        self.read_time
    }

    pub fn to_bytes(&self) -> Result<Bytes, SendError> {
        let start_line = self.start_line();
        encode_message(self.outgoing(&start_line))
    }

    /// Writes the request to `io` within `timeout`.
    pub async fn write<W>(&self, io: &mut W, timeout: Duration) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin,
    {
        let start_line = self.start_line();
        MessageWriter::new(io).send(self.outgoing(&start_line), timeout).await
    }

    /// Writes the request and waits for the response on the same stream, both bounded by
    /// the request timeout.
    pub async fn send<S>(&self, io: &mut S, cancel: &CancellationToken) -> Result<Response, HttpError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        ensure!(!cancel.is_cancelled(), ParseError::Canceled.into());
        self.write(io, self.timeout).await?;
        let options = ReadOptions::with_timeout(self.timeout).cancel_on(cancel.clone());
        Ok(Response::read(io, options).await?)
    }

    fn outgoing<'a>(&'a self, start_line: &'a str) -> OutgoingMessage<'a> {
        OutgoingMessage::new(start_line, &self.headers, self.body.as_deref())
    }
}

impl TryFrom<RawMessage> for Request {
    type Error = ParseError;

    /// Splits the request line into method and target and resolves the full URL from the
    /// `host` header.
    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let tokens: Vec<&str> = raw.start_line.split(' ').collect();
        ensure!(tokens.len() >= 3, ParseError::malformed_start_line(&raw.start_line));

        let method =
            Method::from_bytes(tokens[0].as_bytes()).map_err(|_e| ParseError::malformed_start_line(&raw.start_line))?;
        let target = tokens[1];
        let with_host = match raw.headers.get(HOST) {
            Some(host) if !host.is_empty() => format!("https://{host}{target}").parse::<Uri>().ok(),
            _ => None,
        };
        let uri = with_host
            .map_or_else(|| target.parse::<Uri>(), Ok)
            .unwrap_or_else(|e| {
                warn!(request_target = target, cause = %e, "unresolvable request target");
                Uri::default()
            });

        Ok(Self {
            method,
            uri,
            headers: raw.headers,
            body: raw.body,
            timeout: DEFAULT_TIMEOUT,
            remote_addr: None,
            read_time: raw.read_time,
        })
    }
}

impl fmt::Display for Request {
    /// The wire form of the request, or nothing when it cannot be encoded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bytes() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(_e) => Ok(()),
        }
    }
}

fn host_of(uri: &Uri) -> Option<String> {
    let host = uri.host().filter(|host| !host.is_empty())?;
    Some(match uri.port_u16() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn raw(start_line: &str, headers: &[(&str, &str)]) -> RawMessage {
        RawMessage {
            start_line: start_line.to_string(),
            headers: headers.iter().copied().collect(),
            body: None,
            read_time: Duration::ZERO,
        }
    }

    #[test]
    fn new_adds_host_header() {
        let request = Request::new(Method::GET, "http://example.com/hi?x=1").unwrap();
        assert_eq!(request.header("host"), Some("example.com"));
        assert_eq!(request.request_target(), "/hi?x=1");
        assert_eq!(request.timeout(), DEFAULT_TIMEOUT);

        let request = Request::new(Method::GET, "http://127.0.0.1:8080/").unwrap();
        assert_eq!(request.header("host"), Some("127.0.0.1:8080"));
    }

    #[test]
    fn relative_uri_has_no_host() {
        let request = Request::new(Method::GET, "/hi").unwrap();
        assert!(request.headers().is_empty());
        assert_eq!(request.start_line(), "GET /hi HTTP/1.1");
    }

    #[test]
    fn invalid_uri() {
        assert!(Request::new(Method::GET, "http://exa mple.com/").is_err());
    }

    #[test]
    fn header_mutators_chain() {
        let mut request = Request::new(Method::POST, "http://example.com/").unwrap();
        request.add_header("accept", "a").add_header("accept", "b").set_header("host", "other").delete_header("nope");

        assert_eq!(request.header_values("accept"), vec!["a", "b"]);
        assert_eq!(request.header("host"), Some("other"));
        assert_eq!(request.headers().len(), 3);
    }

    #[test]
    fn lookup_needs_lowercase_name() {
        let request: Request = raw("GET / HTTP/1.1", &[("content-type", "text/plain")]).try_into().unwrap();
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("Content-Type"), None);
    }

    #[test]
    fn renders_wire_bytes() {
        let mut request = Request::new(Method::POST, "http://example.com/upload").unwrap();
        request.add_header("referer", "127.0.0.1").set_body("hi");

        let expected = indoc! {"
        POST /upload HTTP/1.1\r
        host: example.com\r
        referer: 127.0.0.1\r
        content-length: 2\r
        \r
        hi"};
        assert_eq!(request.to_string(), expected);
    }

    #[test]
    fn parses_request_line_and_url() {
        let request: Request = raw("GET /index?a=1 HTTP/1.1", &[("host", "example.com:8080")]).try_into().unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri().host(), Some("example.com"));
        assert_eq!(request.uri().port_u16(), Some(8080));
        assert_eq!(request.uri().path(), "/index");
        assert_eq!(request.uri().query(), Some("a=1"));
    }

    #[test]
    fn url_without_host_header_falls_back_to_target() {
        let request: Request = raw("GET /index HTTP/1.1", &[]).try_into().unwrap();
        assert_eq!(request.uri().path(), "/index");
        assert_eq!(request.uri().host(), None);
    }

    #[test]
    fn two_tokens_are_malformed() {
        let result = Request::try_from(raw("GET /", &[]));
        assert!(matches!(result, Err(ParseError::MalformedStartLine { .. })));
    }

    #[test]
    fn invalid_method_is_malformed() {
        let result = Request::try_from(raw("G(T / HTTP/1.1", &[]));
        assert!(matches!(result, Err(ParseError::MalformedStartLine { .. })));
    }

    #[test]
    fn remote_addr_prefers_real_ip_header() {
        let mut request: Request = raw("GET / HTTP/1.1", &[]).try_into().unwrap();
        assert_eq!(request.remote_addr(), None);

        request.set_remote_addr("10.0.0.1:4000".parse().unwrap());
        assert_eq!(request.remote_addr().as_deref(), Some("10.0.0.1:4000"));

        request.add_header("x-real-ip", "192.168.1.7");
        assert_eq!(request.remote_addr().as_deref(), Some("192.168.1.7"));
    }

    #[test]
    fn clone_with_uri_drops_body() {
        let mut request = Request::new(Method::PUT, "http://a.com/x").unwrap();
        request.set_body("data").set_remote_addr("10.0.0.1:1".parse().unwrap());

        let clone = request.clone_with_uri("http://b.com/y", Duration::from_secs(5)).unwrap();

        assert_eq!(clone.method(), Method::PUT);
        assert_eq!(clone.uri().host(), Some("b.com"));
        assert_eq!(clone.header("host"), Some("a.com"));
        assert_eq!(clone.body(), None);
        assert_eq!(clone.timeout(), Duration::from_secs(5));
        assert_eq!(clone.remote_addr().as_deref(), Some("10.0.0.1:1"));
    }

    #[tokio::test]
    async fn read_from_stream() {
        let mut io = &b"PUT /item HTTP/1.1\r\nHost: example.com\r\nContent-Length: 3\r\n\r\nabc"[..];

        let request = Request::read(&mut io, ReadOptions::new()).await.unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri().to_string(), "https://example.com/item");
        assert_eq!(request.body().unwrap(), &b"abc"[..]);
    }

    #[tokio::test]
    async fn send_canceled_before_write() {
        let (mut client, _server) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        token.cancel();

        let request = Request::new(Method::GET, "http://example.com/").unwrap();
        let result = request.send(&mut client, &token).await;

        assert!(matches!(result, Err(HttpError::ParseError { source: ParseError::Canceled })));
    }
}
