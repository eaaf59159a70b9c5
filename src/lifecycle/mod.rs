//! Request lifecycle management.
//!
//! # Data Flow
//! ```text
//! Caller creates Cancellation
//!     → passed to ComposedPolicy::execute with the request
//!     → every suspension point selects on Cancellation::cancelled()
//!     → caller calls cancel() → pending wait aborts with ResilienceError::Cancelled
//! ```
//!
//! # Design Decisions
//! - Built on a watch channel so late subscribers still see the signal
//! - Caller cancellation is never retryable

pub mod cancellation;

pub use cancellation::Cancellation;
