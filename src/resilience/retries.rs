//! Retry logic for transient faults.
//!
//! # Responsibilities
//! - Decide whether an outcome is retryable (status predicate, transient errors)
//! - Re-run the inner layers once per configured wait, sequentially
//!
//! # Design Decisions
//! - N configured waits mean at most N retries (N + 1 attempts)
//! - A non-empty status override replaces the 408/5xx default, it does not extend it
//! - Connection failures and attempt timeouts are retryable; cancellation and
//!   unclassified errors propagate on first occurrence
//! - When retries run out, the last response or error is returned unchanged

use std::any::Any;
use std::collections::BTreeSet;

use futures_util::future::BoxFuture;
use http::StatusCode;

use crate::http::transport::Response;
use crate::observability::metrics;
use crate::resilience::backoff::BackoffCurve;
use crate::resilience::error::ResilienceResult;
use crate::resilience::policy::{wait, Next, Policy, PolicyKind};

/// Which response status codes trigger a retry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusPredicate {
    /// 408 Request Timeout and every 5xx.
    #[default]
    Default,
    /// Exactly these codes.
    Only(BTreeSet<u16>),
}

impl StatusPredicate {
    /// Build from configured overrides; an empty list keeps the default.
    pub fn from_overrides(codes: &[u16]) -> Self {
        if codes.is_empty() {
            StatusPredicate::Default
        } else {
            StatusPredicate::Only(codes.iter().copied().collect())
        }
    }

    pub fn should_retry(&self, status: StatusCode) -> bool {
        match self {
            StatusPredicate::Default => {
                status == StatusCode::REQUEST_TIMEOUT || status.is_server_error()
            }
            StatusPredicate::Only(codes) => codes.contains(&status.as_u16()),
        }
    }
}

/// Generic transient-fault retry policy.
#[derive(Debug)]
pub struct RetryPolicy {
    curve: BackoffCurve,
    statuses: StatusPredicate,
}

impl RetryPolicy {
    pub fn new(curve: BackoffCurve, statuses: StatusPredicate) -> Self {
        Self { curve, statuses }
    }

    pub fn max_retries(&self) -> usize {
        self.curve.len()
    }

    pub fn curve(&self) -> &BackoffCurve {
        &self.curve
    }

    pub fn statuses(&self) -> &StatusPredicate {
        &self.statuses
    }

    /// The reason to retry this outcome, if any.
    fn retry_cause(&self, outcome: &ResilienceResult<Response>) -> Option<String> {
        match outcome {
            Ok(response) if self.statuses.should_retry(response.status()) => {
                Some(format!("status {}", response.status().as_u16()))
            }
            Ok(_) => None,
            Err(e) if e.is_transient() => Some(e.to_string()),
            Err(_) => None,
        }
    }
}

impl Policy for RetryPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Retry
    }

    fn execute<'a>(&'a self, next: Next<'a>) -> BoxFuture<'a, ResilienceResult<Response>> {
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                let outcome = next.run().await;

                let Some(cause) = self.retry_cause(&outcome) else {
                    return outcome;
                };
                let Some(delay) = self.curve.delay(attempt) else {
                    tracing::warn!(attempts = attempt + 1, %cause, "Retries exhausted");
                    return outcome;
                };

                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = self.curve.len(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    %cause,
                    "Retrying request"
                );
                metrics::record_retry("retry");
                wait(delay, next.cancellation()).await?;
            }
        })
    }

    fn describe(&self) -> String {
        let statuses = match &self.statuses {
            StatusPredicate::Default => "408/5xx".to_string(),
            StatusPredicate::Only(codes) => codes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        };
        format!("waits={:?} statuses={}", self.curve.intervals(), statuses)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
