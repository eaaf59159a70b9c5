//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ResilienceConfig (validated, immutable)
//!     → source.rs (SharedConfig, polled by the pipeline on every build)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<ResilienceConfig>
//!     → next pipeline build observes new config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes replace the whole snapshot
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientThrottleConfig, ConcurrencyConfig, ObservabilityConfig, ResilienceConfig, RetryConfig,
    ServerThrottleConfig, ThrottleBudget, TimeoutConfig,
};
pub use source::{ConfigSource, SharedConfig};
pub use watcher::ConfigWatcher;
