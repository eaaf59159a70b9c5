//! Concurrency admission control (bulkhead).
//!
//! # Responsibilities
//! - Cap the number of requests executing at once
//! - Let a bounded number of requests wait for a slot
//! - Reject immediately once both the slots and the queue are full
//!
//! # Design Decisions
//! - Two semaphores: `admission` (slots + queue) is tried without waiting,
//!   `executing` (slots) is awaited
//! - One instance is shared by every request it admits; the pipeline cache
//!   is what guarantees that sharing
//! - Waiting for a slot races against caller cancellation

use std::any::Any;

use futures_util::future::BoxFuture;
use tokio::sync::Semaphore;

use crate::http::transport::Response;
use crate::observability::metrics;
use crate::resilience::error::{ResilienceError, ResilienceResult};
use crate::resilience::policy::{Next, Policy, PolicyKind};

#[derive(Debug)]
pub struct ConcurrencyLimiter {
    max_concurrent: usize,
    max_queued: usize,
    admission: Semaphore,
    executing: Semaphore,
}

impl ConcurrencyLimiter {
    pub fn new(max_concurrent: usize, max_queued: usize) -> Self {
        let max_concurrent = max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        let max_queued = max_queued.min(Semaphore::MAX_PERMITS - max_concurrent);
        Self {
            max_concurrent,
            max_queued,
            admission: Semaphore::new(max_concurrent + max_queued),
            executing: Semaphore::new(max_concurrent),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn max_queued(&self) -> usize {
        self.max_queued
    }

    /// Requests currently holding an execution slot.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.executing.available_permits()
    }

    /// Requests admitted but still waiting for a slot.
    pub fn queued(&self) -> usize {
        let admitted = self.max_concurrent + self.max_queued - self.admission.available_permits();
        admitted.saturating_sub(self.in_flight())
    }

    fn rejection(&self) -> ResilienceError {
        ResilienceError::AdmissionRejected {
            max_concurrent: self.max_concurrent,
            max_queued: self.max_queued,
        }
    }
}

impl Policy for ConcurrencyLimiter {
    fn kind(&self) -> PolicyKind {
        PolicyKind::MaxConcurrency
    }

    fn execute<'a>(&'a self, next: Next<'a>) -> BoxFuture<'a, ResilienceResult<Response>> {
        Box::pin(async move {
            let Ok(_admitted) = self.admission.try_acquire() else {
                tracing::warn!(
                    max_concurrent = self.max_concurrent,
                    max_queued = self.max_queued,
                    "Concurrency limit reached, rejecting request"
                );
                metrics::record_rejection("admission");
                return Err(self.rejection());
            };

            let _slot = tokio::select! {
                _ = next.cancellation().cancelled() => return Err(ResilienceError::Cancelled),
                permit = self.executing.acquire() => permit.map_err(|_| self.rejection())?,
            };

            next.run().await
        })
    }

    fn describe(&self) -> String {
        format!(
            "max_concurrent={} max_queued={}",
            self.max_concurrent, self.max_queued
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
