//! Policy pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! get_policies(request)
//!     → classify (is_write, is_file_transfer)
//!     → config source snapshot
//!     → components.rs builders, each behind cache.rs
//!         retry · max_concurrency · server_throttle · client_throttle · request_timeout
//!     → drop disabled components, keep order
//!     → composed.rs (outermost first)
//! ```
//!
//! # Design Decisions
//! - Nesting order is fixed; configuration only toggles or tunes components
//! - Stateful components (admission gate, token buckets) are shared across
//!   requests because the cache hands out the same instance until their
//!   config changes
//! - A config change rebuilds only the affected component

pub mod builder;
pub mod cache;
pub mod components;
pub mod composed;
pub mod service;

pub use builder::{CachedPipelineBuilder, PipelineBuilder, PolicyPipeline};
pub use cache::CachedPolicyBuilder;
pub use components::{
    ClientThrottleBuilder, MaxConcurrencyBuilder, Partition, PolicyComponentBuilder,
    RequestTimeoutBuilder, RetryBuilder, ServerThrottleBuilder,
};
pub use composed::ComposedPolicy;
pub use service::ResilientService;
