//! Chunk size line of the chunked transfer encoding.
//!
//! The line holds the size of the following chunk in hexadecimal, optionally followed by
//! `;`-separated chunk extensions which are ignored.

use memchr::memchr;

use crate::ensure;
use crate::protocol::ParseError;

/// Enough hex digits for a `u64`
const MAX_HEX_DIGITS: usize = 16;

/// Parses a chunk size line, without its CRLF.
///
/// Digits are decoded as big-endian nibbles, so an odd number of digits reads the same as if
/// it were left padded with a `'0'`: `"a"` is `0x0a`.
pub fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let digits = match memchr(b';', line) {
        Some(p) => &line[..p],
        None => line,
    }
    .trim_ascii();

    ensure!(!digits.is_empty(), ParseError::invalid_chunk_size("missing size"));
    ensure!(
        digits.len() <= MAX_HEX_DIGITS,
        ParseError::invalid_chunk_size(format!("{} hex digits exceed the limit {MAX_HEX_DIGITS}", digits.len()))
    );

    let mut size = 0u64;
    for &b in digits {
        let nibble = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b + 10 - b'a',
            b'A'..=b'F' => b + 10 - b'A',
            _ => return Err(ParseError::invalid_chunk_size(format!("invalid hex digit {:?}", b as char))),
        };
        size = (size << 4) | u64::from(nibble);
    }

    Ok(size)
}
