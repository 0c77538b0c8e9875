//! The network boundary.
//!
//! # Design
//! A `Transport` performs one exchange and hands back the raw response; it
//! knows nothing about requests, codecs or layers. `UreqTransport` is the
//! default. Because `ureq` is blocking, each exchange runs on tokio's blocking
//! pool, which keeps the dispatch the only point where `Client::send` awaits.
//! Polled outside a tokio runtime it fails with a transport error instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::error::BoxError;
use crate::http::HttpRequest;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` and return the response, whatever its status.
    /// Only failures to complete the exchange are errors.
    async fn execute(&self, request: HttpRequest) -> Result<http::Response<Bytes>, BoxError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<http::Response<Bytes>, BoxError> {
        (**self).execute(request).await
    }
}

/// `Transport` backed by a `ureq::Agent`.
///
/// Response bodies are read in full with no size limit unless one is set with
/// [`UreqTransport::body_limit`].
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::configured(None)
    }

    /// Fail any exchange that takes longer than `timeout` end to end.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::configured(Some(timeout))
    }

    /// Use a preconfigured agent. It should be built with
    /// `http_status_as_error(false)`; otherwise 4xx/5xx responses surface as
    /// transport errors instead of reaching the decoders.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            body_limit: u64::MAX,
        }
    }

    /// Fail exchanges whose response body is longer than `limit` bytes.
    pub fn body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    fn configured(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self::from_agent(agent)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<http::Response<Bytes>, BoxError> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let agent = self.agent.clone();
        let body_limit = self.body_limit;
        trace!(method = %request.method, url = %request.url, "dispatching request");
        let response = runtime
            .spawn_blocking(move || run(&agent, body_limit, request))
            .await??;
        trace!(status = %response.status(), bytes = response.body().len(), "response received");
        Ok(response)
    }
}

fn run(agent: &ureq::Agent, body_limit: u64, request: HttpRequest) -> Result<http::Response<Bytes>, BoxError> {
    let mut builder = http::Request::builder()
        .method(request.method)
        .uri(request.url.as_str());
    if let Some(headers) = builder.headers_mut() {
        headers.extend(request.headers);
    }

    let response = match request.body {
        Some(body) => agent.run(builder.body(body.to_vec())?)?,
        None => agent.run(builder.body(())?)?,
    };

    let (parts, mut body) = response.into_parts();
    let bytes = body.with_config().limit(body_limit).read_to_vec()?;
    Ok(http::Response::from_parts(parts, Bytes::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    fn request() -> HttpRequest {
        HttpRequest::new(Method::GET, Url::parse("http://127.0.0.1:9/").unwrap())
    }

    #[test]
    fn outside_a_runtime_is_an_error_not_a_panic() {
        let transport = UreqTransport::new();
        let err = futures::executor::block_on(transport.execute(request())).unwrap_err();
        assert!(err.is::<tokio::runtime::TryCurrentError>(), "got {err}");
    }

    #[test]
    fn body_limit_defaults_to_unbounded() {
        assert_eq!(UreqTransport::new().body_limit, u64::MAX);
        assert_eq!(UreqTransport::new().body_limit(1024).body_limit, 1024);
    }
}
