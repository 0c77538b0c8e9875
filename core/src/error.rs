//! Error types for the courier request pipeline.
//!
//! # Design
//! Each stage of `Client::send` fails with its own variant so callers can
//! tell a malformed URL from a codec failure from a network failure. Errors
//! about a received response own the `Envelope` that caused them, so the raw
//! bytes and metadata travel with the error and can be replayed in a test.

use std::fmt;

use serde_json::error::Category;
use thiserror::Error;

use crate::codec::Charset;
use crate::http::Envelope;

/// Type-erased error used at the transport and layer seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Any failure surfaced by `Client::send` or a `Layer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The URL or headers for the request could not be put together.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// The request body could not be serialized.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The transport failed to complete the exchange (connectivity, TLS, timeout).
    #[error("transport failed: {0}")]
    Transport(#[source] BoxError),

    /// The response body could not be decoded into the declared type.
    #[error(transparent)]
    Decoding(Box<DecodingError>),

    /// A layer built with `Layer::error_for_status` rejected a non-2xx response.
    #[error(transparent)]
    Status(Box<UnexpectedStatus>),

    /// A caller-supplied layer raised its own error.
    #[error("layer failed: {0}")]
    Layer(#[source] BoxError),
}

impl Error {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Error::Transport(err.into())
    }

    pub fn layer(err: impl Into<BoxError>) -> Self {
        Error::Layer(err.into())
    }

    /// The received response attached to this error, if the failure happened
    /// after a response arrived.
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Error::Decoding(err) => Some(err.envelope()),
            Error::Status(err) => Some(err.envelope()),
            _ => None,
        }
    }
}

impl From<DecodingError> for Error {
    fn from(err: DecodingError) -> Self {
        Error::Decoding(Box::new(err))
    }
}

impl From<UnexpectedStatus> for Error {
    fn from(err: UnexpectedStatus) -> Self {
        Error::Status(Box::new(err))
    }
}

/// Failures while composing the outgoing URL or headers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConstructionError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The base URL has no hierarchical path (e.g. `mailto:`), so a request
    /// path cannot be appended to it.
    #[error("cannot append a path to '{url}'")]
    CannotBeABase { url: String },

    #[error("invalid header name '{name}'")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    #[error("invalid value for header '{name}'")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}

/// Failures while serializing a request body.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodingError {
    #[error("failed to encode {type_name} as JSON: {source}")]
    Json {
        /// Type of the value that failed to serialize.
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("character {character:?} at byte {position} cannot be encoded as {charset}")]
    Text {
        charset: Charset,
        character: char,
        position: usize,
    },

    #[error("failed to encode multipart field '{field}': {source}")]
    Part {
        field: String,
        #[source]
        source: BoxError,
    },

    #[error("encoded body produced an invalid '{name}' header")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}

/// Line and column (both 1-based) of a decoding failure inside the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Locate a byte offset within `bytes`, counting lines by `\n`.
    pub fn at_offset(bytes: &[u8], offset: usize) -> Self {
        let prefix = &bytes[..offset.min(bytes.len())];
        let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = prefix.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        Location {
            line,
            column: prefix.len() - line_start + 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// What kind of decoder rejected the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodingErrorKind {
    /// `serde_json` failed; the category tells syntax errors from shape mismatches.
    Json(Category),
    /// The bytes are not valid in the expected character set.
    Text { charset: Charset },
}

/// A response body could not be decoded into the declared response type.
///
/// Carries the complete received `Envelope`, so both the bytes and the
/// metadata are available to whoever handles the error.
#[derive(Debug)]
pub struct DecodingError {
    envelope: Envelope,
    kind: DecodingErrorKind,
    location: Option<Location>,
    message: String,
    source: Option<BoxError>,
}

impl DecodingError {
    pub(crate) fn json(envelope: Envelope, err: serde_json::Error) -> Self {
        // serde_json reports line 0 for errors that have no position (e.g. io).
        let location = (err.line() > 0).then(|| Location {
            line: err.line(),
            column: err.column(),
        });
        Self {
            envelope,
            kind: DecodingErrorKind::Json(err.classify()),
            location,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub(crate) fn text(envelope: Envelope, charset: Charset, offset: usize) -> Self {
        let location = Location::at_offset(envelope.body(), offset);
        Self {
            message: format!("response body is not valid {charset}: unexpected byte at offset {offset}"),
            envelope,
            kind: DecodingErrorKind::Text { charset },
            location: Some(location),
            source: None,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn into_envelope(self) -> Envelope {
        self.envelope
    }

    pub fn kind(&self) -> DecodingErrorKind {
        self.kind
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.envelope.metadata();
        writeln!(f, "{}", self.message)?;
        writeln!(f)?;
        writeln!(f, "The data to decode was:")?;
        writeln!(f, "{}", String::from_utf8_lossy(self.envelope.body()))?;
        writeln!(f)?;
        writeln!(f, "which was received with the following response:")?;
        write!(f, "{:?} {} from {}", metadata.version(), metadata.status(), metadata.url())?;
        for (name, value) in metadata.headers() {
            write!(f, "\n{name}: {}", String::from_utf8_lossy(value.as_bytes()))?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// A response arrived with a status outside `200..=299`.
#[derive(Debug, Error)]
#[error("unexpected HTTP status {} from {}", .envelope.status(), .envelope.metadata().url())]
pub struct UnexpectedStatus {
    envelope: Envelope,
}

impl UnexpectedStatus {
    pub fn new(envelope: Envelope) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn into_envelope(self) -> Envelope {
        self.envelope
    }
}
