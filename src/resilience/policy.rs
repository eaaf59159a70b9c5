//! The seam every runtime policy plugs into.
//!
//! A policy receives a [`Next`] handle for the layers inside it and decides
//! whether, when, and how many times to run it. The innermost `Next` is the
//! transport send.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::http::transport::{PendingRequest, Response, Transport};
use crate::lifecycle::Cancellation;
use crate::resilience::error::{ResilienceError, ResilienceResult};

/// The five pipeline components, in nesting order (outermost first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyKind {
    Retry,
    MaxConcurrency,
    ServerThrottle,
    ClientThrottle,
    RequestTimeout,
}

impl PolicyKind {
    /// Fixed nesting order, outermost to innermost.
    pub const ORDER: [PolicyKind; 5] = [
        PolicyKind::Retry,
        PolicyKind::MaxConcurrency,
        PolicyKind::ServerThrottle,
        PolicyKind::ClientThrottle,
        PolicyKind::RequestTimeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Retry => "retry",
            PolicyKind::MaxConcurrency => "max_concurrency",
            PolicyKind::ServerThrottle => "server_throttle",
            PolicyKind::ClientThrottle => "client_throttle",
            PolicyKind::RequestTimeout => "request_timeout",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cross-cutting behavior wrapped around the rest of the pipeline.
pub trait Policy: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> PolicyKind;

    /// Run `next`, applying this policy's behavior.
    fn execute<'a>(&'a self, next: Next<'a>) -> BoxFuture<'a, ResilienceResult<Response>>;

    /// Human-readable parameters, e.g. for `explain`.
    fn describe(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

/// The remaining layers of a composed policy plus the terminal send.
///
/// `Next` is `Copy`: a retrying policy runs the same handle once per attempt.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    layers: &'a [Arc<dyn Policy>],
    transport: &'a dyn Transport,
    request: &'a PendingRequest,
    cancellation: &'a Cancellation,
}

impl<'a> Next<'a> {
    pub fn new(
        layers: &'a [Arc<dyn Policy>],
        transport: &'a dyn Transport,
        request: &'a PendingRequest,
        cancellation: &'a Cancellation,
    ) -> Self {
        Self {
            layers,
            transport,
            request,
            cancellation,
        }
    }

    pub fn request(&self) -> &'a PendingRequest {
        self.request
    }

    pub fn cancellation(&self) -> &'a Cancellation {
        self.cancellation
    }

    /// Run the next layer, or the transport if none remain.
    pub fn run(self) -> BoxFuture<'a, ResilienceResult<Response>> {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.execute(Next {
                layers: rest,
                ..self
            }),
            None => Box::pin(async move {
                if self.cancellation.is_cancelled() {
                    return Err(ResilienceError::Cancelled);
                }
                self.transport
                    .send(self.request, self.cancellation)
                    .await
                    .map_err(ResilienceError::from)
            }),
        }
    }
}

/// Sleep for `delay` unless the caller cancels first.
pub(crate) async fn wait(delay: Duration, cancellation: &Cancellation) -> ResilienceResult<()> {
    tokio::select! {
        _ = cancellation.cancelled() => Err(ResilienceError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
