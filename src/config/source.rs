//! Live configuration source.
//!
//! # Responsibilities
//! - Hand out the current configuration snapshot to the pipeline
//! - Accept new snapshots from the watcher (or tests) without blocking readers
//!
//! # Design Decisions
//! - Snapshots are `Arc<ResilienceConfig>` and never mutated in place
//! - Swaps are atomic (arc-swap); a reader sees either the old or the new snapshot

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::ResilienceConfig;
use crate::observability::metrics;

/// Something the pipeline can poll for the current configuration.
pub trait ConfigSource: Send + Sync {
    /// The configuration in effect right now.
    fn current(&self) -> Arc<ResilienceConfig>;
}

/// A configuration slot that can be replaced while the pipeline is running.
#[derive(Debug)]
pub struct SharedConfig {
    inner: ArcSwap<ResilienceConfig>,
}

impl SharedConfig {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    /// Replace the active configuration.
    pub fn store(&self, config: ResilienceConfig) {
        self.inner.store(Arc::new(config));
        metrics::record_config_reload("applied");
    }

    /// Apply an edit to a copy of the current configuration and store the result.
    pub fn update(&self, edit: impl Fn(&mut ResilienceConfig)) {
        self.inner.rcu(|current| {
            let mut next = ResilienceConfig::clone(current);
            edit(&mut next);
            next
        });
        metrics::record_config_reload("applied");
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(ResilienceConfig::default())
    }
}

impl ConfigSource for SharedConfig {
    fn current(&self) -> Arc<ResilienceConfig> {
        self.inner.load_full()
    }
}

impl ConfigSource for ResilienceConfig {
    fn current(&self) -> Arc<ResilienceConfig> {
        Arc::new(self.clone())
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn current(&self) -> Arc<ResilienceConfig> {
        (**self).current()
    }
}
