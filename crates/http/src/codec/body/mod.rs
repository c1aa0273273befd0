//! HTTP body framing helpers
//!
//! Fixed length bodies need nothing beyond [`LineBuffer::take_exact`](crate::codec::LineBuffer::take_exact);
//! chunked bodies additionally need the chunk size line parser found here.

mod chunk_size;

pub use chunk_size::parse_chunk_size;
