//! Header line parsing and framing detection.

use memchr::memchr;

use crate::protocol::TransferMode;
use crate::protocol::names::{CONTENT_LENGTH, TRAILER, TRANSFER_ENCODING};

/// A single `name: value` line of a header block.
///
/// The name is trimmed and lowercased, the value is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    pub name: String,
    pub value: &'a str,
}

impl<'a> HeaderLine<'a> {
    /// Splits `line` at its first colon. Lines without a colon are not headers.
    pub fn parse(line: &'a str) -> Option<HeaderLine<'a>> {
        let p = memchr(b':', line.as_bytes())?;
        let name = line[..p].trim().to_ascii_lowercase();
        let value = line[p + 1..].trim();
        Some(HeaderLine { name, value })
    }
}

/// Body framing collected while the header block is scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Framing {
    pub mode: TransferMode,
    /// Lowercase names declared by a `trailer` header
    pub trailers: Vec<String>,
}

impl Framing {
    /// Records what a header line says about the body.
    ///
    /// Whichever of `content-length` and `transfer-encoding: chunked` comes last in the block
    /// decides the mode. An unparsable `content-length` counts as zero.
    pub fn observe(&mut self, header: &HeaderLine<'_>) {
        match header.name.as_str() {
            CONTENT_LENGTH => {
                self.mode = TransferMode::Length(header.value.parse().unwrap_or(0));
            }
            TRANSFER_ENCODING if is_chunked(header.value) => {
                self.mode = TransferMode::Chunked;
            }
            TRAILER => {
                self.trailers = header
                    .value
                    .split(',')
                    .map(|name| name.trim().to_ascii_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect();
            }
            _ => {}
        }
    }
}

/// chunked must be the final coding applied
fn is_chunked(value: &str) -> bool {
    value.rsplit(',').next().is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe_all(lines: &[&str]) -> Framing {
        let mut framing = Framing::default();
        for line in lines {
            framing.observe(&HeaderLine::parse(line).unwrap());
        }
        framing
    }

    #[test]
    fn trims_and_lowercases_name() {
        let header = HeaderLine::parse("  Content-Type :  text/plain ").unwrap();
        assert_eq!(header.name, "content-type");
        assert_eq!(header.value, "text/plain");
    }

    #[test]
    fn splits_at_first_colon() {
        let header = HeaderLine::parse("Host: 127.0.0.1:8080").unwrap();
        assert_eq!(header.name, "host");
        assert_eq!(header.value, "127.0.0.1:8080");
    }

    #[test]
    fn line_without_colon_is_not_a_header() {
        assert_eq!(HeaderLine::parse("garbage"), None);
    }

    #[test]
    fn content_length_any_case() {
        assert_eq!(observe_all(&["Content-Length: 5"]).mode, TransferMode::Length(5));
        assert_eq!(observe_all(&["content-length: 5"]).mode, TransferMode::Length(5));
    }

    #[test]
    fn malformed_content_length_is_zero() {
        assert_eq!(observe_all(&["Content-Length: abc"]).mode, TransferMode::Length(0));
        assert_eq!(observe_all(&["Content-Length: -4"]).mode, TransferMode::Length(0));
    }

    #[test]
    fn last_framing_header_wins() {
        let framing = observe_all(&["Content-Length: 5", "Transfer-Encoding: Chunked"]);
        assert_eq!(framing.mode, TransferMode::Chunked);

        let framing = observe_all(&["Transfer-Encoding: chunked", "Content-Length: 5"]);
        assert_eq!(framing.mode, TransferMode::Length(5));
    }

    #[test]
    fn chunked_as_final_coding() {
        assert_eq!(observe_all(&["Transfer-Encoding: gzip, chunked"]).mode, TransferMode::Chunked);
        assert_eq!(observe_all(&["Transfer-Encoding: gzip"]).mode, TransferMode::Empty);
    }

    #[test]
    fn trailer_names_are_normalized() {
        let framing = observe_all(&["Trailer: Expires, X-Checksum ,"]);
        assert_eq!(framing.trailers, vec!["expires".to_string(), "x-checksum".to_string()]);
    }
}
