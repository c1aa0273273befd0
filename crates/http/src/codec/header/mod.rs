//! HTTP header block processing
//!
//! - [`HeaderLine`]: parses one `name: value` line of a header block
//! - [`Framing`]: tracks `content-length`, `transfer-encoding` and `trailer` while the block
//!   is read, deciding how the body is framed

mod header_line;

pub use header_line::Framing;
pub use header_line::HeaderLine;
