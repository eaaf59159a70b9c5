//! Transport seam.
//!
//! # Responsibilities
//! - Define the "attempt a request, get a response or an error" primitive
//!   the composed policy wraps
//! - Provide a reqwest-backed implementation for real use
//!
//! # Design Decisions
//! - Object safe: the pipeline holds `&dyn Transport`
//! - The request is borrowed so retries can resend it without cloning
//! - Transports classify their own failures into `TransportError`; a connection
//!   lost while reading the body counts as a connection failure

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;

use crate::lifecycle::Cancellation;
use crate::resilience::error::TransportError;

/// A request as handed to the pipeline.
pub type PendingRequest = http::Request<Bytes>;

/// A fully buffered response.
pub type Response = http::Response<Bytes>;

/// Sends one attempt of a request.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a PendingRequest,
        cancellation: &'a Cancellation,
    ) -> BoxFuture<'a, Result<Response, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send<'a>(
        &'a self,
        request: &'a PendingRequest,
        cancellation: &'a Cancellation,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        (**self).send(request, cancellation)
    }
}

/// Transport backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send_once(&self, request: &PendingRequest) -> Result<Response, TransportError> {
        let response = self
            .client
            .request(request.method().clone(), request.uri().to_string())
            .headers(request.headers().clone())
            .body(request.body().clone())
            .send()
            .await
            .map_err(map_send_error)?;

        let mut builder = http::Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }
        let body = response.bytes().await.map_err(map_body_error)?;

        builder
            .body(body)
            .map_err(|e| TransportError::Other(Box::new(e)))
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a PendingRequest,
        cancellation: &'a Cancellation,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        Box::pin(async move {
            tokio::select! {
                _ = cancellation.cancelled() => Err(TransportError::Cancelled),
                result = self.send_once(request) => result,
            }
        })
    }
}

fn map_send_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_request() || has_io_cause(&err) {
        TransportError::Connection(Box::new(err))
    } else {
        TransportError::Other(Box::new(err))
    }
}

/// Failures while streaming the body mean the connection was lost mid-response.
///
/// No content decoders are enabled, so a decode error here can only come
/// from a truncated or reset stream.
fn map_body_error(err: reqwest::Error) -> TransportError {
    if err.is_body() || err.is_decode() || has_io_cause(&err) {
        TransportError::Connection(Box::new(err))
    } else {
        TransportError::Other(Box::new(err))
    }
}

fn has_io_cause(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<std::io::Error>() {
            return true;
        }
        source = cause.source();
    }
    false
}
