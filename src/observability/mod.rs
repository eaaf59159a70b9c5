//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline and policies produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Every retry, rejection and timeout is logged at warn with its cause
//! - Metrics are cheap (atomic increments, no-op without a recorder)

pub mod logging;
pub mod metrics;
