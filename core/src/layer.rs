//! Composable middleware around the transport.
//!
//! # Design
//! A `Layer` is a single `send` function from `HttpRequest` to
//! `Result<Envelope, Error>`. Every builder method consumes a layer and
//! returns a new one that owns it as `next`, so a chain is a singly linked
//! list from the outermost layer down to the terminal transport layer.
//!
//! For `base.read_request(a).read_request(b)`, `b` is outermost: outgoing
//! requests are seen by `b`, then `a`, then `base`; responses come back
//! through `base`, then `a`, then `b`.
//!
//! Only `wrap_errors` may change which error a caller sees. Every other
//! builder either leaves the error untouched or never sees it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, UnexpectedStatus};
use crate::http::{Envelope, HttpRequest};
use crate::transport::Transport;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of sending a request through a layer.
pub type SendResult = Result<Envelope, Error>;

type SendFn = dyn Fn(HttpRequest) -> BoxFuture<'static, SendResult> + Send + Sync;

#[derive(Clone)]
pub struct Layer {
    send: Arc<SendFn>,
}

impl Layer {
    /// A layer from a bare send function. Useful as a stand-in transport in
    /// tests, or for layers that never call through to anything.
    pub fn new<F, Fut>(send: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SendResult> + Send + 'static,
    {
        Self {
            send: Arc::new(move |request: HttpRequest| -> BoxFuture<'static, SendResult> {
                Box::pin(send(request))
            }),
        }
    }

    /// The terminal layer: hands the request to `transport` and wraps what
    /// comes back in an `Envelope`.
    pub fn transport<T: Transport + 'static>(transport: T) -> Self {
        let transport = Arc::new(transport);
        Self::new(move |request: HttpRequest| {
            let transport = Arc::clone(&transport);
            async move {
                let url = request.url.clone();
                let response = transport.execute(request).await.map_err(Error::Transport)?;
                Ok(Envelope::from_response(url, response))
            }
        })
    }

    pub fn send(&self, request: HttpRequest) -> BoxFuture<'static, SendResult> {
        (self.send)(request)
    }

    /// Wrap this layer in a new one. `layer` receives each request together
    /// with this layer as `next`; it may call `next` any number of times, or
    /// not at all.
    pub fn wrap<F, Fut>(self, layer: F) -> Self
    where
        F: Fn(HttpRequest, Layer) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SendResult> + Send + 'static,
    {
        Self::new(move |request| layer(request, self.clone()))
    }

    /// Modify each request before passing it on. An error aborts the send.
    pub fn transform_request<F>(self, transform: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.wrap(move |mut request, next| {
            let outcome = transform(&mut request);
            async move {
                outcome?;
                next.send(request).await
            }
        })
    }

    pub fn read_request<F>(self, read: F) -> Self
    where
        F: Fn(&HttpRequest) + Send + Sync + 'static,
    {
        self.wrap(move |request, next| {
            read(&request);
            next.send(request)
        })
    }

    /// Replace each successful response. Failures pass through untouched.
    pub fn transform_response<F>(self, transform: F) -> Self
    where
        F: Fn(Envelope) -> Result<Envelope, Error> + Send + Sync + 'static,
    {
        let transform = Arc::new(transform);
        self.wrap(move |request, next| {
            let transform = Arc::clone(&transform);
            async move { transform(next.send(request).await?) }
        })
    }

    pub fn read_response<F>(self, read: F) -> Self
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        let read = Arc::new(read);
        self.wrap(move |request, next| {
            let read = Arc::clone(&read);
            async move {
                let envelope = next.send(request).await?;
                read(&envelope);
                Ok(envelope)
            }
        })
    }

    /// Replace every error raised below this layer.
    pub fn wrap_errors<F>(self, wrap_error: F) -> Self
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        let wrap_error = Arc::new(wrap_error);
        self.wrap(move |request, next| {
            let wrap_error = Arc::clone(&wrap_error);
            async move { next.send(request).await.map_err(|err| wrap_error(err)) }
        })
    }

    /// Observe the outcome, success or failure, without changing it.
    pub fn read_result<F>(self, read: F) -> Self
    where
        F: Fn(&SendResult) + Send + Sync + 'static,
    {
        let read = Arc::new(read);
        self.wrap(move |request, next| {
            let read = Arc::clone(&read);
            async move {
                let result = next.send(request).await;
                read(&result);
                result
            }
        })
    }

    /// Observe each request together with its outcome once the exchange is over.
    pub fn read_exchange<F>(self, read: F) -> Self
    where
        F: Fn(&HttpRequest, &SendResult) + Send + Sync + 'static,
    {
        let read = Arc::new(read);
        self.wrap(move |request, next| {
            let read = Arc::clone(&read);
            async move {
                let sent = request.clone();
                let result = next.send(request).await;
                read(&sent, &result);
                result
            }
        })
    }

    /// Log every exchange passing through this layer. Bodies shorter than
    /// `max_body_len` bytes are logged too.
    pub fn print_exchanges(self, max_body_len: usize) -> Self {
        self.read_exchange(move |request, result| {
            let path = request.url.path();
            info!(
                "{path}: sent {}-byte {} request to {}",
                request.body_len(),
                request.method,
                request.url
            );
            if let Some(body) = request.body.as_ref().filter(|body| body.len() < max_body_len) {
                info!("{}", String::from_utf8_lossy(body));
            }

            match result {
                Ok(envelope) => {
                    info!(
                        "{path}: received {}-byte response with status {}",
                        envelope.body().len(),
                        envelope.status()
                    );
                    if envelope.body().len() < max_body_len {
                        info!("{}", String::from_utf8_lossy(envelope.body()));
                    }
                }
                Err(err) => warn!("{path}: exchange failed: {err}"),
            }
        })
    }

    /// Turn responses with a non-2xx status into `Error::Status`.
    pub fn error_for_status(self) -> Self {
        self.transform_response(|envelope| {
            if envelope.metadata().is_success() {
                Ok(envelope)
            } else {
                Err(UnexpectedStatus::new(envelope).into())
            }
        })
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer").finish_non_exhaustive()
    }
}
