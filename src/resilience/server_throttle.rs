//! Server throttle handling.
//!
//! Absorbs the remote API's own throttling (HTTP 429) with a backoff curve
//! tuned independently of the generic retry layer. The two layers keep
//! separate budgets: exhausting one never consumes the other.

use std::any::Any;
use std::time::Duration;

use futures_util::future::BoxFuture;
use http::StatusCode;

use crate::http::transport::Response;
use crate::observability::metrics;
use crate::resilience::backoff::{retry_after, BackoffCurve};
use crate::resilience::error::ResilienceResult;
use crate::resilience::policy::{wait, Next, Policy, PolicyKind};

/// How a `Retry-After` hint is taken: clamped into `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfterBounds {
    min: Duration,
    max: Duration,
}

impl RetryAfterBounds {
    /// `max` below `min` is raised to `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn clamp(&self, hint: Duration) -> Duration {
        hint.clamp(self.min, self.max)
    }
}

#[derive(Debug)]
pub struct ServerThrottlePolicy {
    curve: BackoffCurve,
    /// `None` retries until the server stops throttling.
    max_retries: Option<usize>,
    /// `None` ignores `Retry-After` and always follows the curve.
    retry_after: Option<RetryAfterBounds>,
}

impl ServerThrottlePolicy {
    pub fn new(
        curve: BackoffCurve,
        limit_retries: bool,
        retry_after: Option<RetryAfterBounds>,
    ) -> Self {
        let max_retries = limit_retries.then(|| curve.len());
        Self {
            curve,
            max_retries,
            retry_after,
        }
    }

    pub fn max_retries(&self) -> Option<usize> {
        self.max_retries
    }

    pub fn retry_after_bounds(&self) -> Option<RetryAfterBounds> {
        self.retry_after
    }

    fn delay_for(&self, attempt: usize, response: &Response) -> Duration {
        let hinted = self
            .retry_after
            .and_then(|bounds| retry_after(response.headers()).map(|hint| bounds.clamp(hint)));
        hinted
            .or_else(|| self.curve.delay_saturating(attempt))
            .unwrap_or_default()
    }
}

impl Policy for ServerThrottlePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ServerThrottle
    }

    fn execute<'a>(&'a self, next: Next<'a>) -> BoxFuture<'a, ResilienceResult<Response>> {
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                let outcome = next.run().await;
                let delay = match &outcome {
                    Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                        self.delay_for(attempt, response)
                    }
                    _ => return outcome,
                };
                if self.max_retries.is_some_and(|max| attempt >= max) {
                    tracing::warn!(attempts = attempt + 1, "Server still throttling, giving up");
                    return outcome;
                }

                attempt += 1;
                tracing::warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Server throttled request, backing off"
                );
                metrics::record_retry("server_throttle");
                wait(delay, next.cancellation()).await?;
            }
        })
    }

    fn describe(&self) -> String {
        let max = self
            .max_retries
            .map_or_else(|| "unbounded".to_string(), |m| m.to_string());
        let hint = self.retry_after.map_or_else(
            || "ignored".to_string(),
            |b| format!("{:?}..={:?}", b.min, b.max),
        );
        format!(
            "waits={:?} max_retries={} retry_after={}",
            self.curve.intervals(),
            max,
            hint
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
