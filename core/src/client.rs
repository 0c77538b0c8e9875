//! Turns typed requests into transport calls and responses back into values.
//!
//! # Design
//! `Client` holds only read-only configuration: the base URL, default
//! headers, codecs, an observer and the layer chain. `send` is split into the
//! same three stages for every request: `raw_request` builds the
//! `HttpRequest` synchronously, the layer chain dispatches it (the only
//! `.await`), and the request's own decode hook interprets the `Envelope`.
//! `url_for` and `raw_request` are public so request construction can be
//! tested without any I/O.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::codec::{Codecs, JsonDecoder, JsonEncoder};
use crate::error::{ConstructionError, Error};
use crate::http::HttpRequest;
use crate::layer::Layer;
use crate::observer::{Observer, TracingObserver};
use crate::request::{Request, UrlParams};
use crate::transport::{Transport, UreqTransport};

/// Sends `Request`s relative to a base URL.
///
/// Cloning is cheap and clones share the same layer chain.
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    default_headers: HeaderMap,
    codecs: Codecs,
    observer: Arc<dyn Observer>,
    layer: Layer,
}

impl Client {
    /// A client with default settings, dispatching through `UreqTransport`,
    /// which needs `send` to run inside a tokio runtime.
    pub fn new(base_url: Url) -> Self {
        Self::builder(base_url).build()
    }

    pub fn parse(base_url: &str) -> Result<Self, ConstructionError> {
        let url = Url::parse(base_url).map_err(|source| ConstructionError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self::new(url))
    }

    pub fn builder(base_url: Url) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn codecs(&self) -> &Codecs {
        &self.codecs
    }

    /// The URL `request` will be sent to: base URL (or the request's
    /// override), then the path, then the query parameters.
    pub fn url_for<R: Request>(&self, request: &R) -> Result<Url, ConstructionError> {
        let mut url = request
            .base_url_override()
            .unwrap_or(&self.base_url)
            .clone();

        let path = request.path();
        if !path.is_empty() {
            append_path(&mut url, &path)?;
        }
        append_query(&mut url, &request.url_params());
        Ok(url)
    }

    /// Build the transport request for `request` without sending it.
    pub fn raw_request<R: Request>(&self, request: &R) -> Result<HttpRequest, Error> {
        let mut raw = HttpRequest::new(request.method(), self.url_for(request)?);

        if let Some(content_type) = request.content_type() {
            let value = HeaderValue::try_from(content_type.as_ref()).map_err(|source| {
                ConstructionError::InvalidHeaderValue {
                    name: CONTENT_TYPE.to_string(),
                    source,
                }
            })?;
            raw.headers.insert(CONTENT_TYPE, value);
        }
        raw.headers.extend(self.default_headers.clone());

        request.encode(&mut raw, &self.codecs_for(request))?;
        Ok(raw)
    }

    /// Encode `request`, dispatch it through the layer chain and decode the
    /// response into `R::Response`.
    pub async fn send<R: Request>(&self, request: &R) -> Result<R::Response, Error> {
        let raw = self.raw_request(request)?;
        self.observer.outgoing(&raw);

        let envelope = self.layer.send(raw).await?;
        self.observer.incoming(&envelope);

        Ok(request.decode(envelope, &self.codecs_for(request))?)
    }

    fn codecs_for<R: Request>(&self, request: &R) -> Codecs {
        request.codec_override().unwrap_or(self.codecs)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("default_headers", &self.default_headers)
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

/// Join `path` onto the end of `url`'s path with exactly one `/` between them.
fn append_path(url: &mut Url, path: &str) -> Result<(), ConstructionError> {
    if url.cannot_be_a_base() {
        return Err(ConstructionError::CannotBeABase {
            url: url.to_string(),
        });
    }
    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    Ok(())
}

/// Everything except RFC 3986 unreserved characters is escaped, so a space
/// is `%20` and `&`, `=`, `+` and `#` never leak into the query syntax.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

fn append_query(url: &mut Url, params: &UrlParams) {
    if params.is_empty() {
        return;
    }
    let mut query = url.query().filter(|query| !query.is_empty()).map(str::to_string).unwrap_or_default();
    for (name, value) in params.iter() {
        if !query.is_empty() {
            query.push('&');
        }
        query.extend(utf8_percent_encode(name, QUERY_COMPONENT));
        if let Some(value) = value {
            query.push('=');
            query.extend(utf8_percent_encode(value, QUERY_COMPONENT));
        }
    }
    url.set_query(Some(&query));
}

type LayerFn = Box<dyn FnOnce(Layer) -> Layer + Send>;

/// Configures a `Client`. Only the base URL is required.
pub struct ClientBuilder {
    base_url: Url,
    default_headers: HeaderMap,
    codecs: Codecs,
    observer: Arc<dyn Observer>,
    transport: Arc<dyn Transport>,
    layers: Vec<LayerFn>,
}

impl ClientBuilder {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            default_headers: HeaderMap::new(),
            codecs: Codecs::default(),
            observer: Arc::new(TracingObserver),
            transport: Arc::new(UreqTransport::new()),
            layers: Vec::new(),
        }
    }

    /// Add a header to every request, replacing any header of the same name.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    pub fn codecs(mut self, codecs: Codecs) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn json_encoder(mut self, encoder: JsonEncoder) -> Self {
        self.codecs.json_encoder = encoder;
        self
    }

    pub fn json_decoder(mut self, decoder: JsonDecoder) -> Self {
        self.codecs.json_decoder = decoder;
        self
    }

    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Replace the terminal transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Wrap the chain built so far. The first layer added sits directly on
    /// the transport; each later one wraps the previous.
    pub fn layer(mut self, wrap: impl FnOnce(Layer) -> Layer + Send + 'static) -> Self {
        self.layers.push(Box::new(wrap));
        self
    }

    pub fn build(self) -> Client {
        let layer = self
            .layers
            .into_iter()
            .fold(Layer::transport(self.transport), |layer, wrap| wrap(layer));
        Client {
            base_url: self.base_url,
            default_headers: self.default_headers,
            codecs: self.codecs,
            observer: self.observer,
            layer,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("default_headers", &self.default_headers)
            .field("codecs", &self.codecs)
            .field("layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}
