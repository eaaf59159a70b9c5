//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request through a composed policy (outermost first):
//!     → retries.rs (transient faults: 408/5xx, connection, timeout)
//!     → concurrency.rs (admission gate, bounded queue)
//!     → server_throttle.rs (HTTP 429 backoff)
//!     → rate_limit.rs (client token bucket per traffic class)
//!     → timeouts.rs (per-attempt deadline)
//!     → transport send
//! ```
//!
//! # Design Decisions
//! - Every policy implements one trait (`Policy`) and calls `Next::run` for the rest
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Rejections (admission, rate limit) fail fast and are never retried here
//! - Caller cancellation aborts any wait and is never retried
//! - All waiting goes through `tokio::time`, so paused-clock tests are deterministic

pub mod backoff;
pub mod concurrency;
pub mod error;
pub mod policy;
pub mod rate_limit;
pub mod retries;
pub mod server_throttle;
pub mod timeouts;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::BackoffCurve;
pub use concurrency::ConcurrencyLimiter;
pub use error::{BoxError, ResilienceError, ResilienceResult, TransportError};
pub use policy::{Next, Policy, PolicyKind};
pub use rate_limit::ClientThrottle;
pub use retries::{RetryPolicy, StatusPredicate};
pub use server_throttle::{RetryAfterBounds, ServerThrottlePolicy};
pub use timeouts::RequestTimeout;
