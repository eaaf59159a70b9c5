//! Caching decorator for component builders.
//!
//! # Responsibilities
//! - Return the previously built policy while the component's config fields
//!   are unchanged, rebuild when they change
//! - Keep one entry per classification partition
//!
//! # Design Decisions
//! - Keys are compared by value; an equal config rebuilt from scratch still hits
//! - The compare-build-store sequence runs under the entry's shard lock, so
//!   concurrent callers never see a torn (key, policy) pair and never race
//!   two fresh stateful instances into existence
//! - For the admission gate and the token buckets this cache is what makes
//!   the instance shared; it is a correctness requirement

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::ResilienceConfig;
use crate::http::request::RequestClassification;
use crate::observability::metrics;
use crate::pipeline::components::{Partition, PolicyComponentBuilder};
use crate::resilience::{Policy, PolicyKind};

/// The last key seen and what was built for it.
#[derive(Debug)]
pub struct CacheEntry<K> {
    last_key: K,
    last_policy: Option<Arc<dyn Policy>>,
}

/// Wraps any [`PolicyComponentBuilder`] and memoizes its output.
#[derive(Debug)]
pub struct CachedPolicyBuilder<B: PolicyComponentBuilder> {
    inner: B,
    entries: DashMap<Partition, CacheEntry<B::Key>>,
}

impl<B: PolicyComponentBuilder> CachedPolicyBuilder<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn rebuild(
        &self,
        partition: Partition,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        let policy = self.inner.build(class, config);
        tracing::debug!(
            component = %self.inner.kind(),
            ?partition,
            enabled = policy.is_some(),
            "Built policy component"
        );
        metrics::record_policy_build(self.inner.kind().as_str());
        policy
    }
}

impl<B: PolicyComponentBuilder> PolicyComponentBuilder for CachedPolicyBuilder<B> {
    type Key = B::Key;

    fn kind(&self) -> PolicyKind {
        self.inner.kind()
    }

    fn partition(&self, class: RequestClassification) -> Partition {
        self.inner.partition(class)
    }

    fn cache_key(&self, class: RequestClassification, config: &ResilienceConfig) -> B::Key {
        self.inner.cache_key(class, config)
    }

    fn build(
        &self,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        let partition = self.inner.partition(class);
        let key = self.inner.cache_key(class, config);

        match self.entries.entry(partition) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().last_key == key {
                    return occupied.get().last_policy.clone();
                }
                let policy = self.rebuild(partition, class, config);
                occupied.insert(CacheEntry {
                    last_key: key,
                    last_policy: policy.clone(),
                });
                policy
            }
            Entry::Vacant(vacant) => {
                let policy = self.rebuild(partition, class, config);
                vacant.insert(CacheEntry {
                    last_key: key,
                    last_policy: policy.clone(),
                });
                policy
            }
        }
    }
}
