//! Transport-level request and response values.
//!
//! # Design
//! `HttpRequest` is the plain-data form of an outgoing call: the client builds
//! it, layers may rewrite it, and a `Transport` executes it. `Envelope` is the
//! received counterpart: the terminal layer creates exactly one per round trip
//! and it is read-only from then on. A layer that wants a different response
//! builds a new envelope instead of mutating the one it was given.

use bytes::Bytes;
use http::header::{AsHeaderName, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::codec::{Charset, JsonDecoder};
use crate::error::DecodingError;

/// An outgoing HTTP request described as plain data.
///
/// `body` is `None` when the request carries no body at all, which is
/// distinct from `Some` of an empty buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Header value as text, `None` if absent or not visible ASCII.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// Status line, headers and origin of a received response.
#[derive(Debug, Clone)]
pub struct Metadata {
    status: StatusCode,
    headers: HeaderMap,
    version: Version,
    url: Url,
}

impl Metadata {
    pub fn new(status: StatusCode, headers: HeaderMap, version: Version, url: Url) -> Self {
        Self {
            status,
            headers,
            version,
            url,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The URL the request was sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }
}

/// Raw body bytes paired with the metadata they arrived with.
#[derive(Debug, Clone)]
pub struct Envelope {
    body: Bytes,
    metadata: Metadata,
}

impl Envelope {
    pub fn new(body: impl Into<Bytes>, metadata: Metadata) -> Self {
        Self {
            body: body.into(),
            metadata,
        }
    }

    /// Wrap a transport response received for a request sent to `url`.
    pub fn from_response(url: Url, response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            body,
            metadata: Metadata::new(parts.status, parts.headers, parts.version, url),
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn status(&self) -> StatusCode {
        self.metadata.status
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    pub fn into_parts(self) -> (Bytes, Metadata) {
        (self.body, self.metadata)
    }

    /// Decode the body as text in `charset`.
    pub fn text(&self, charset: Charset) -> Result<String, DecodingError> {
        charset
            .decode(&self.body)
            .map_err(|offset| DecodingError::text(self.clone(), charset, offset))
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self, decoder: &JsonDecoder) -> Result<T, DecodingError> {
        decoder
            .decode(&self.body)
            .map_err(|err| DecodingError::json(self.clone(), err))
    }
}
