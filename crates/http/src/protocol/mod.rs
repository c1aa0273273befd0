//! Core HTTP protocol abstractions.
//!
//! This module holds the message model shared by the reader, the encoder and the
//! connection loop.
//!
//! # Architecture
//!
//! - **Messages** ([`message`]): the raw wire shape of a message
//!   - [`RawMessage`]: start line, ordered headers and an assembled body as read
//!   - [`OutgoingMessage`]: borrowed view handed to the encoder
//!   - [`TransferMode`]: how a body is framed on the wire
//!
//! - **Headers** ([`header`]): [`Headers`], an ordered list of name/value pairs that keeps
//!   duplicates, plus the well known [`names`]
//!
//! - **Requests and responses** ([`request`], [`response`]): typed views over
//!   [`RawMessage`] with method, URL and status parsed
//!
//! - **Content decoding** ([`content`]): the [`ContentDecoder`] seam used by
//!   [`Response::decode_content`]
//!
//! - **Error Handling** ([`error`]):
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Message reading errors
//!   - [`SendError`]: Message writing errors
//!   - [`DecodeError`]: Content decoding errors

mod message;
pub use message::OutgoingMessage;
pub use message::RawMessage;
pub use message::TransferMode;

mod header;
pub use header::Headers;
pub use header::names;

mod request;
pub use request::DEFAULT_TIMEOUT;
pub use request::Request;

mod response;
pub use response::Response;

mod content;
pub use content::ContentDecoder;

mod error;
pub use error::DecodeError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
