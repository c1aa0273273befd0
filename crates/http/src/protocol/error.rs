use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("parse error: {source}")]
    ParseError {
        #[from]
        source: ParseError,
    },

    #[error("send error: {source}")]
    SendError {
        #[from]
        source: SendError,
    },

    #[error("content decode error: {source}")]
    DecodeError {
        #[from]
        source: DecodeError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed start line: {line:?}")]
    MalformedStartLine { line: String },

    #[error("invalid status code: {line:?}")]
    InvalidStatusCode { line: String },

    #[error("invalid chunk size line: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("line size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeLine { current_size: usize, max_size: usize },

    #[error("trailer headers are not supported: {names:?}")]
    UnsupportedTrailerHeaders { names: Vec<String> },

    #[error("read deadline exceeded")]
    DeadlineExceeded,

    #[error("canceled")]
    Canceled,

    #[error("connection closed before a message started")]
    Closed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_start_line<S: ToString>(line: S) -> Self {
        Self::MalformedStartLine { line: line.to_string() }
    }

    pub fn invalid_status_code<S: ToString>(line: S) -> Self {
        Self::InvalidStatusCode { line: line.to_string() }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn too_large_line(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeLine { current_size, max_size }
    }

    pub fn unsupported_trailer_headers(names: Vec<String>) -> Self {
        Self::UnsupportedTrailerHeaders { names }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("empty start line")]
    EmptyStartLine,

    #[error("write deadline exceeded")]
    DeadlineExceeded,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported content encoding: {coding}")]
    UnsupportedContentEncoding { coding: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl DecodeError {
    pub fn unsupported<S: ToString>(coding: S) -> Self {
        Self::UnsupportedContentEncoding { coding: coding.to_string() }
    }
}
