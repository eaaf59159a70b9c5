//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound each attempt of a request by wall-clock time
//! - Pick the deadline by transfer class (standard vs. file transfer)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors and retryable one layer out
//! - No retrying here; the retry layer owns that

use std::any::Any;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::http::request::TransferClass;
use crate::http::transport::Response;
use crate::observability::metrics;
use crate::resilience::error::{ResilienceError, ResilienceResult};
use crate::resilience::policy::{Next, Policy, PolicyKind};

#[derive(Debug)]
pub struct RequestTimeout {
    timeout: Duration,
    transfer: TransferClass,
}

impl RequestTimeout {
    pub fn new(timeout: Duration, transfer: TransferClass) -> Self {
        Self { timeout, transfer }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transfer(&self) -> TransferClass {
        self.transfer
    }
}

impl Policy for RequestTimeout {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RequestTimeout
    }

    fn execute<'a>(&'a self, next: Next<'a>) -> BoxFuture<'a, ResilienceResult<Response>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, next.run()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        transfer = %self.transfer,
                        "Request attempt timed out"
                    );
                    metrics::record_timeout(self.transfer.as_str());
                    Err(ResilienceError::Timeout {
                        after: self.timeout,
                        transfer: self.transfer,
                    })
                }
            }
        })
    }

    fn describe(&self) -> String {
        format!("timeout={:?} transfer={}", self.timeout, self.transfer)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
