//! Capability contracts: reusable ways to encode a request body and decode a
//! response body.
//!
//! # Design
//! A contract is a zero-sized strategy type implementing [`Encode`] and/or
//! [`Decode`]. A [`Request`] names one of each through its associated types,
//! so a type can never carry two encoders or two decoders. When a strategy
//! needs data from the request (the JSON body, the text to send, the parts of
//! a form) it asks for it through a small capability trait the request
//! implements alongside `Request`.
//!
//! | Strategy | Encode | Decode |
//! |---|---|---|
//! | [`Get`] | no body, `GET` | none |
//! | [`Json`] | [`JsonBody`], `application/json` | `Response: DeserializeOwned` |
//! | [`Text`] | [`TextBody`], `text/plain` | [`TextResponse`], `Response = String` |
//! | [`Raw`] | [`RawBody`] | `Response = Bytes` |
//! | [`Multipart`] | [`MultipartBody`], `multipart/form-data` | none |
//! | [`StatusOnly`] | none | `Response = ()` |

mod decode;
mod encode;
mod multipart;

use std::borrow::Cow;

use bytes::Bytes;
use http::Method;
use serde::Serialize;

use crate::codec::{Charset, Codecs};
use crate::error::{DecodingError, EncodingError};
use crate::http::{Envelope, HttpRequest};
use crate::request::Request;

pub use multipart::Part;

/// Writes the body of an `R` into the outgoing request.
pub trait Encode<R> {
    fn default_method() -> Method {
        Method::POST
    }

    fn content_type(_request: &R) -> Option<Cow<'static, str>> {
        None
    }

    fn encode(request: &R, raw: &mut HttpRequest, codecs: &Codecs) -> Result<(), EncodingError>;
}

/// Turns a received envelope into `R::Response`.
pub trait Decode<R: Request> {
    fn decode(request: &R, envelope: Envelope, codecs: &Codecs) -> Result<R::Response, DecodingError>;
}

/// No body; defaults to `GET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Get;

/// JSON body and/or JSON response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

/// Text body and/or text response in a declared character set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

/// Bytes passed through unchanged in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

/// `multipart/form-data` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multipart;

/// Response body ignored; only the fact that a response arrived matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnly;

/// Data for the [`Json`] encoder. A request that is its own body sets
/// `type Body = Self` and returns `self`.
pub trait JsonBody {
    type Body: Serialize + ?Sized;

    fn body(&self) -> &Self::Body;
}

/// Data for the [`Text`] encoder.
pub trait TextBody {
    fn text(&self) -> Cow<'_, str>;

    fn charset(&self) -> Charset {
        Charset::Utf8
    }
}

/// Settings for the [`Text`] decoder.
pub trait TextResponse {
    fn response_charset(&self) -> Charset {
        Charset::Utf8
    }
}

/// Data for the [`Raw`] encoder.
pub trait RawBody {
    fn raw_body(&self) -> Bytes;

    fn raw_content_type(&self) -> Option<Cow<'static, str>> {
        None
    }
}

/// Data for the [`Multipart`] encoder: named parts in the order they are sent.
pub trait MultipartBody {
    fn parts(&self) -> Vec<(String, Part)>;
}
