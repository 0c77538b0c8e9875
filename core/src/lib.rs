//! Declarative HTTP client built from typed requests and composable layers.
//!
//! # Overview
//! An API call is a type implementing [`Request`]. It names its path, its
//! query parameters and, through two associated strategy types, how its body
//! is encoded and how the response is decoded. [`Client::send`] turns the
//! value into an [`HttpRequest`], pushes it through a chain of [`Layer`]s down
//! to a [`Transport`], and decodes the resulting [`Envelope`].
//!
//! # Design
//! - Encoding and decoding strategies ([`Json`], [`Text`], [`Raw`],
//!   [`Multipart`], [`Get`], [`StatusOnly`]) are zero-sized markers. A request
//!   gets exactly one of each because they are associated types, and a
//!   strategy only applies when the request provides the matching capability
//!   trait ([`JsonBody`], [`TextBody`], and so on).
//! - `Client` is read-only after construction and cheap to clone, so one
//!   instance can serve concurrent sends.
//! - Request construction (`Client::raw_request`) is synchronous and does no
//!   I/O; the layer chain is the only suspension point.
//! - Errors keep the received `Envelope` wherever one exists, so callers can
//!   inspect status, headers and body after a failure.

pub mod client;
pub mod codec;
pub mod config;
pub mod contract;
pub mod error;
pub mod http;
pub mod layer;
pub mod observer;
pub mod request;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use codec::{Charset, Codecs, JsonDecoder, JsonEncoder};
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use contract::{
    Decode, Encode, Get, Json, JsonBody, Multipart, MultipartBody, Part, Raw, RawBody, StatusOnly, Text, TextBody,
    TextResponse,
};
pub use error::{
    BoxError, ConstructionError, DecodingError, DecodingErrorKind, EncodingError, Error, Location, UnexpectedStatus,
};
pub use self::http::{Envelope, HttpRequest, Metadata};
pub use layer::{BoxFuture, Layer, SendResult};
pub use observer::{Observer, TracingObserver};
pub use request::{Request, UrlParams};
pub use transport::{Transport, UreqTransport};
