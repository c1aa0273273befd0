//! HTTP codec module for reading and writing HTTP/1.1 messages
//!
//! # Architecture
//!
//! - Reading:
//!   - [`LineBuffer`]: growable input buffer with CRLF line framing and exact reads
//!   - [`MessageReader`]: state machine rebuilding one message from a stream, bounded by
//!     the deadline and cancellation token of [`ReadOptions`]
//!   - Header line parsing via the `header` module, chunk size parsing via the `body` module
//!
//! - Writing:
//!   - [`MessageEncoder`]: renders a whole message into bytes, always framing a body with a
//!     computed `content-length`
//!
//! # Example
//!
//! ```no_run
//! use micro_h1::codec::MessageEncoder;
//! use micro_h1::protocol::{Headers, OutgoingMessage};
//! use tokio_util::codec::Encoder;
//! use bytes::BytesMut;
//!
//! let mut headers = Headers::new();
//! headers.add("host", "example.com");
//!
//! let mut buffer = BytesMut::new();
//! MessageEncoder::new()
//!     .encode(OutgoingMessage::new("GET / HTTP/1.1", &headers, None), &mut buffer)
//!     .unwrap();
//! ```

mod body;
mod header;
mod line_buffer;
mod message_encoder;
mod message_reader;

pub use body::parse_chunk_size;
pub use header::{Framing, HeaderLine};
pub use line_buffer::{LINE_READ_CHUNK, LineBuffer};
pub use message_encoder::{MessageEncoder, encode_message};
pub use message_reader::{MAX_LINE_BYTES, MessageReader, ReadOptions};
