//! The `Request` trait: one logical call and how to encode and decode it.
//!
//! # Design
//! A request type picks exactly one encode strategy and one decode strategy
//! through its `Encoding` and `Decoding` associated types. Everything else
//! (method, content type, body, response parsing) defaults from those two
//! choices, so a typical request only states its path, its parameters and the
//! data its strategies read:
//!
//! ```ignore
//! #[derive(Serialize)]
//! struct CreateNote { text: String }
//!
//! impl Request for CreateNote {
//!     type Response = Note;
//!     type Encoding = Json;
//!     type Decoding = Json;
//!
//!     fn path(&self) -> Cow<'_, str> {
//!         "notes".into()
//!     }
//! }
//!
//! impl JsonBody for CreateNote {
//!     type Body = Self;
//!     fn body(&self) -> &Self { self }
//! }
//! ```

use std::borrow::Cow;
use std::fmt::Display;

use http::Method;
use url::Url;

use crate::codec::Codecs;
use crate::contract::{Decode, Encode};
use crate::error::{DecodingError, EncodingError};
use crate::http::{Envelope, HttpRequest};

pub trait Request: Sized {
    /// The value a successful round trip produces.
    type Response;
    /// How the body is written; see [`crate::contract`].
    type Encoding: Encode<Self>;
    /// How the response is read; see [`crate::contract`].
    type Decoding: Decode<Self>;

    /// Path relative to the base URL, e.g. `format!("users/{id}")`.
    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    /// When set, `path` is resolved against this URL instead of the client's.
    fn base_url_override(&self) -> Option<&Url> {
        None
    }

    fn method(&self) -> Method {
        <Self::Encoding as Encode<Self>>::default_method()
    }

    fn content_type(&self) -> Option<Cow<'static, str>> {
        <Self::Encoding as Encode<Self>>::content_type(self)
    }

    /// Query parameters, in the order they should appear in the URL.
    fn url_params(&self) -> UrlParams {
        UrlParams::new()
    }

    /// Codec settings to use instead of the client's for this request.
    fn codec_override(&self) -> Option<Codecs> {
        None
    }

    fn encode(&self, raw: &mut HttpRequest, codecs: &Codecs) -> Result<(), EncodingError> {
        <Self::Encoding as Encode<Self>>::encode(self, raw, codecs)
    }

    fn decode(&self, envelope: Envelope, codecs: &Codecs) -> Result<Self::Response, DecodingError> {
        <Self::Decoding as Decode<Self>>::decode(self, envelope, codecs)
    }
}

/// Ordered query parameters. Values are stringified with `Display`; a
/// parameter without a value is written as a bare key (`?verbose`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    params: Vec<(String, Option<String>)>,
}

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.push(name, value);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.params.push((name.into(), None));
        self
    }

    /// Add the parameter only when `value` is `Some`.
    pub fn with_opt<V: Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Display) {
        self.params.push((name.into(), Some(value.to_string())));
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for UrlParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = UrlParams::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_declaration_order_and_stringify() {
        let params = UrlParams::new()
            .with("one", "te&st")
            .with("two", 42)
            .with_flag("verbose")
            .with_opt("skipped", None::<u8>)
            .with_opt("kept", Some(1.5));

        let items: Vec<_> = params.iter().collect();
        assert_eq!(
            items,
            vec![
                ("one", Some("te&st")),
                ("two", Some("42")),
                ("verbose", None),
                ("kept", Some("1.5")),
            ]
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn params_from_iterator() {
        let params: UrlParams = [("page", 2), ("limit", 10)].into_iter().collect();
        assert_eq!(params, UrlParams::new().with("page", 2).with("limit", 10));
        assert!(UrlParams::new().is_empty());
    }
}
