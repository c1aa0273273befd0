//! Content decoding seam.
//!
//! The reader never looks at `content-encoding`; decompressing a body is a separate step a
//! caller runs on a fully assembled response, see
//! [`Response::decode_content`](crate::protocol::Response::decode_content).
//! Implementations live outside this crate so the core carries no codec dependency.

use bytes::Bytes;

use crate::protocol::DecodeError;

pub trait ContentDecoder {
    /// Undoes one content coding, as named by a `content-encoding` value.
    fn decode(&self, coding: &str, body: Bytes) -> Result<Bytes, DecodeError>;
}

impl<F> ContentDecoder for F
where
    F: Fn(&str, Bytes) -> Result<Bytes, DecodeError>,
{
    fn decode(&self, coding: &str, body: Bytes) -> Result<Bytes, DecodeError> {
        self(coding, body)
    }
}
