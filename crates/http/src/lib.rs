//! An asynchronous HTTP/1.1 message codec
//!
//! This crate reads and writes whole HTTP/1.1 messages over any tokio stream. A message is
//! rebuilt into its start line, an ordered list of header pairs and a fully assembled body,
//! with every read bounded by a deadline and a cancellation token.
//!
//! # Features
//!
//! - Incremental CRLF line framing over partial reads
//! - `content-length` and chunked bodies, chunked bodies are reassembled in memory
//! - Duplicate headers kept in wire order
//! - Per message deadlines and cooperative cancellation
//! - Outgoing bodies always framed with a computed `content-length`
//! - Optional content decoding through the [`protocol::ContentDecoder`] seam
//! - A small sequential server loop for request/response exchanges
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use http::{Method, StatusCode};
//! use tokio::net::{TcpListener, TcpStream};
//! use tokio_util::sync::CancellationToken;
//! use tracing::{error, info, warn};
//! use micro_h1::connection::HttpConnection;
//! use micro_h1::handler::make_handler;
//! use micro_h1::protocol::{Request, Response};
//!
//! async fn hello(request: Request) -> Result<Response, std::io::Error> {
//!     info!(path = request.request_target(), "request");
//!     let mut response = Response::new(StatusCode::OK, "OK");
//!     response.set_body("Hello World!\r\n");
//!     Ok(response)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler = Arc::new(make_handler(hello));
//!     let shutdown = CancellationToken::new();
//!
//!     tokio::spawn({
//!         let (handler, shutdown) = (handler.clone(), shutdown.clone());
//!         async move {
//!             loop {
//!                 let (stream, remote_addr) = match listener.accept().await {
//!                     Ok(accepted) => accepted,
//!                     Err(e) => {
//!                         warn!(cause = %e, "failed to accept");
//!                         continue;
//!                     }
//!                 };
//!                 let (handler, shutdown) = (handler.clone(), shutdown.clone());
//!                 tokio::spawn(async move {
//!                     let (reader, writer) = stream.into_split();
//!                     let connection = HttpConnection::new(reader, writer).with_remote_addr(remote_addr);
//!                     if let Err(e) = connection.process(handler, shutdown).await {
//!                         error!(cause = %e, "connection shutdown");
//!                     }
//!                 });
//!             }
//!         }
//!     });
//!
//!     let mut stream = TcpStream::connect("127.0.0.1:8080").await?;
//!     let mut request = Request::new(Method::GET, "http://127.0.0.1:8080/")?;
//!     request.set_timeout(Duration::from_secs(5));
//!     let response = request.send(&mut stream, &CancellationToken::new()).await?;
//!     info!(status = %response.status(), "response");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: line buffer, message reader and message encoder
//! - [`protocol`]: headers, request and response models, errors
//! - [`connection`]: buffered message writer and the server loop
//! - [`handler`]: request handler trait and utilities
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - Trailer headers are rejected rather than parsed
//! - Bodies are buffered whole, no streaming
//! - Header names are lowercased on read, lookups are case-sensitive

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::{deadline_after, ensure};
