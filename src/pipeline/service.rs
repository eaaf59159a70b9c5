//! Tower adapter.
//!
//! Resolves the composed policy per request and runs the send through it, so
//! the pipeline can sit at the bottom of any tower stack.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tower::Service;

use crate::http::transport::{PendingRequest, Response, Transport};
use crate::lifecycle::Cancellation;
use crate::pipeline::builder::PolicyPipeline;
use crate::resilience::ResilienceError;

/// `tower::Service` that sends every request through a policy pipeline.
///
/// Always ready: admission and rate limiting happen inside the call and
/// fail fast with a typed error instead of applying backpressure.
pub struct ResilientService<T> {
    pipeline: Arc<dyn PolicyPipeline>,
    transport: Arc<T>,
    cancellation: Cancellation,
}

impl<T: Transport + 'static> ResilientService<T> {
    pub fn new(pipeline: Arc<dyn PolicyPipeline>, transport: Arc<T>) -> Self {
        Self {
            pipeline,
            transport,
            cancellation: Cancellation::new(),
        }
    }

    /// Tie every call to `cancellation`; cancelling it aborts in-flight calls.
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }
}

impl<T> Clone for ResilientService<T> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            transport: Arc::clone(&self.transport),
            cancellation: self.cancellation.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ResilientService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientService")
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T: Transport + 'static> Service<PendingRequest> for ResilientService<T> {
    type Response = Response;
    type Error = ResilienceError;
    type Future = BoxFuture<'static, Result<Response, ResilienceError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: PendingRequest) -> Self::Future {
        let policy = self.pipeline.get_policies(&request);
        let transport = Arc::clone(&self.transport);
        let cancellation = self.cancellation.clone();

        Box::pin(async move {
            policy
                .execute(transport.as_ref(), &request, &cancellation)
                .await
        })
    }
}
