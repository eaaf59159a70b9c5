//! Resilience policy pipeline for a bulk content-migration engine.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod resilience;

pub use config::schema::ResilienceConfig;
pub use lifecycle::Cancellation;
pub use pipeline::{CachedPipelineBuilder, ComposedPolicy, PipelineBuilder, PolicyPipeline};
pub use resilience::{ResilienceError, ResilienceResult};
