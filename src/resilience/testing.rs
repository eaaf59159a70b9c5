//! Scripted transport for policy tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{Method, StatusCode};
use tokio::time::Instant;

use crate::http::transport::{PendingRequest, Response, Transport};
use crate::lifecycle::Cancellation;
use crate::resilience::error::{ResilienceResult, TransportError};
use crate::resilience::policy::{Next, Policy};

/// What the transport does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Status(u16),
    Throttled { retry_after_secs: Option<u64> },
    Connection,
    Other,
    Slow(Duration, u16),
}

/// Plays back a script of steps; the last step repeats once the script runs out.
#[derive(Debug)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        let steps: VecDeque<Step> = steps.into_iter().collect();
        let last = steps.back().cloned().unwrap_or(Step::Status(200));
        Arc::new(Self {
            steps: Mutex::new(steps),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new([step])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.lock().unwrap().clone())
    }
}

fn response(status: u16) -> Response {
    http::Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .body(Bytes::new())
        .unwrap()
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        _request: &'a PendingRequest,
        cancellation: &'a Cancellation,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let step = self.next_step();

        Box::pin(async move {
            match step {
                Step::Status(status) => Ok(response(status)),
                Step::Throttled { retry_after_secs } => {
                    let mut resp = response(429);
                    if let Some(secs) = retry_after_secs {
                        resp.headers_mut()
                            .insert(http::header::RETRY_AFTER, http::HeaderValue::from(secs));
                    }
                    Ok(resp)
                }
                Step::Connection => Err(TransportError::Connection("connection refused".into())),
                Step::Other => Err(TransportError::Other("malformed payload".into())),
                Step::Slow(delay, status) => {
                    tokio::select! {
                        _ = cancellation.cancelled() => Err(TransportError::Cancelled),
                        _ = tokio::time::sleep(delay) => Ok(response(status)),
                    }
                }
            }
        })
    }
}

pub fn request(method: Method, path: &str) -> PendingRequest {
    http::Request::builder()
        .method(method)
        .uri(format!("https://server.example.com{path}"))
        .body(Bytes::new())
        .unwrap()
}

pub fn get() -> PendingRequest {
    request(Method::GET, "/api/3.19/sites/s1/projects")
}

/// Execute `layers` around `transport` with a fresh cancellation.
pub async fn run_layers(
    layers: &[Arc<dyn Policy>],
    transport: &dyn Transport,
    request: &PendingRequest,
) -> ResilienceResult<Response> {
    let cancellation = Cancellation::new();
    Next::new(layers, transport, request, &cancellation).run().await
}
