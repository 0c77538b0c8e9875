//! Diagnostic hooks around the layer chain.

use tracing::debug;

use crate::http::{Envelope, HttpRequest};

/// Sees every fully built outgoing request and every incoming envelope a
/// `Client` handles. Hooks only observe; they can't change what is sent or
/// received.
pub trait Observer: Send + Sync {
    fn outgoing(&self, _request: &HttpRequest) {}

    fn incoming(&self, _envelope: &Envelope) {}
}

/// Silent observer.
impl Observer for () {}

/// The default observer: one `debug!` event per direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn outgoing(&self, request: &HttpRequest) {
        debug!(
            method = %request.method,
            url = %request.url,
            content_type = request.content_type(),
            bytes = request.body_len(),
            "outgoing request"
        );
    }

    fn incoming(&self, envelope: &Envelope) {
        let metadata = envelope.metadata();
        debug!(
            status = %metadata.status(),
            url = %metadata.url(),
            content_type = metadata.content_type(),
            bytes = envelope.body().len(),
            "incoming response"
        );
    }
}
