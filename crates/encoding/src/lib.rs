//! Content decoding for micro-h1 responses
//!
//! Undoes the `content-encoding` of an assembled body. Plugs into
//! [`Response::decode_content`](micro_h1::protocol::Response::decode_content) through
//! [`Decompressor`]:
//!
//! ```no_run
//! use micro_h1::protocol::Response;
//! use micro_h1_encoding::Decompressor;
//!
//! fn plain(mut response: Response) -> Result<Response, micro_h1::protocol::DecodeError> {
//!     response.decode_content(&Decompressor)?;
//!     Ok(response)
//! }
//! ```
//!
//! Supported codings are `gzip` (and `x-gzip`), `deflate` and `br`; `identity` passes the
//! body through. `zstd` and anything else fail with
//! [`DecodeError::UnsupportedContentEncoding`](micro_h1::protocol::DecodeError::UnsupportedContentEncoding).

mod decoder;

pub use decoder::{ContentCoding, Decompressor, decode};
