//! HTTP connection handling module
//!
//! # Components
//!
//! - [`MessageWriter`]: encodes messages into a buffer and writes them to a stream under a
//!   write deadline
//! - [`HttpConnection`]: sequential server loop that reads a request, runs the handler and
//!   writes the response, until the peer closes or shutdown is requested

mod http_connection;
mod message_writer;

pub use http_connection::HttpConnection;
pub use message_writer::MessageWriter;
