use std::convert::Infallible;
use std::fmt;
use std::io;
use std::io::Read;
use std::str::FromStr;

use bytes::{Buf, Bytes};
use flate2::read::{GzDecoder, ZlibDecoder};
use micro_h1::protocol::{ContentDecoder, DecodeError};
use tracing::{trace, warn};

/// Input buffer size handed to the brotli decompressor
const BROTLI_BUFFER_SIZE: usize = 4 * 1024;

/// A content coding as named by a `content-encoding` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentCoding {
    /// Gzip encoding, also sent as `x-gzip`.
    Gzip,
    /// Deflate encoding, a zlib stream.
    Deflate,
    /// Brotli encoding.
    Br,
    /// No transformation.
    Identity,
    /// Zstd encoding, recognized but not decodable.
    Zstd,
    Unknown(String),
}

impl FromStr for ContentCoding {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coding = s.trim().to_ascii_lowercase();
        Ok(match coding.as_str() {
            "gzip" | "x-gzip" => Self::Gzip,
            "deflate" => Self::Deflate,
            "br" => Self::Br,
            "identity" => Self::Identity,
            "zstd" => Self::Zstd,
            _ => Self::Unknown(coding),
        })
    }
}

impl ContentCoding {
    /// Returns the name of the coding.
    pub fn name(&self) -> &str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::Br => "br",
            Self::Identity => "identity",
            Self::Zstd => "zstd",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Zstd | Self::Unknown(_))
    }

    /// Undoes this coding on a whole body.
    pub fn decode(&self, body: Bytes) -> Result<Bytes, DecodeError> {
        match self {
            Self::Identity => Ok(body),
            Self::Gzip => read_all(GzDecoder::new(body.reader()), "gzip"),
            Self::Deflate => read_all(ZlibDecoder::new(body.reader()), "deflate"),
            Self::Br => read_all(brotli::Decompressor::new(body.reader(), BROTLI_BUFFER_SIZE), "br"),
            Self::Zstd | Self::Unknown(_) => {
                warn!(coding = self.name(), "unsupported content encoding");
                Err(DecodeError::unsupported(self.name()))
            }
        }
    }
}

impl fmt::Display for ContentCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Undoes the content coding named `coding` on `body`.
pub fn decode(coding: &str, body: Bytes) -> Result<Bytes, DecodeError> {
    let Ok(coding) = coding.parse::<ContentCoding>();
    coding.decode(body)
}

/// [`ContentDecoder`] for gzip, deflate and brotli bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decompressor;

impl ContentDecoder for Decompressor {
    fn decode(&self, coding: &str, body: Bytes) -> Result<Bytes, DecodeError> {
        decode(coding, body)
    }
}

fn read_all<R: Read>(mut reader: R, coding: &'static str) -> Result<Bytes, DecodeError> {
    let mut buf = Vec::new();
    match reader.read_to_end(&mut buf) {
        Ok(len) => {
            trace!(coding, len, "decoded body");
            Ok(buf.into())
        }
        Err(err) => {
            trace!("Error decoding {} encoding: {}", coding, err);
            Err(io::Error::new(err.kind(), format!("{coding}: {err}")).into())
        }
    }
}
