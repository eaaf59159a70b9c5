//! Pipeline builders.
//!
//! # Responsibilities
//! - Classify the request, poll the config source, ask every component for
//!   its (cached) policy
//! - Nest the non-empty policies in the fixed order
//!   `Retry → MaxConcurrency → ServerThrottle → ClientThrottle → RequestTimeout`
//!
//! # Design Decisions
//! - `PipelineBuilder` recomposes on every call; only component identity matters
//! - `CachedPipelineBuilder` also reuses the composed wrapper per classification
//!   while every component returns the same instance as last time
//! - Each builder owns its component caches, so two builders never share
//!   admission gates or token buckets

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::{ConfigSource, ResilienceConfig};
use crate::http::request::{classify_request, RequestClassification};
use crate::http::transport::PendingRequest;
use crate::pipeline::cache::CachedPolicyBuilder;
use crate::pipeline::components::{
    ClientThrottleBuilder, MaxConcurrencyBuilder, PolicyComponentBuilder, RequestTimeoutBuilder,
    RetryBuilder, ServerThrottleBuilder,
};
use crate::pipeline::composed::ComposedPolicy;
use crate::resilience::Policy;

/// Produces the composed policy for a request.
pub trait PolicyPipeline: Send + Sync {
    fn get_policies(&self, request: &PendingRequest) -> Arc<ComposedPolicy> {
        self.get_policies_for(classify_request(request))
    }

    fn get_policies_for(&self, class: RequestClassification) -> Arc<ComposedPolicy>;
}

/// The five cached component builders of one pipeline.
#[derive(Debug)]
struct Components {
    retry: CachedPolicyBuilder<RetryBuilder>,
    max_concurrency: CachedPolicyBuilder<MaxConcurrencyBuilder>,
    server_throttle: CachedPolicyBuilder<ServerThrottleBuilder>,
    client_throttle: CachedPolicyBuilder<ClientThrottleBuilder>,
    request_timeout: CachedPolicyBuilder<RequestTimeoutBuilder>,
}

impl Components {
    fn new() -> Self {
        Self {
            retry: CachedPolicyBuilder::new(RetryBuilder),
            max_concurrency: CachedPolicyBuilder::new(MaxConcurrencyBuilder),
            server_throttle: CachedPolicyBuilder::new(ServerThrottleBuilder),
            client_throttle: CachedPolicyBuilder::new(ClientThrottleBuilder),
            request_timeout: CachedPolicyBuilder::new(RequestTimeoutBuilder),
        }
    }

    /// Component policies in nesting order, disabled ones dropped.
    fn resolve(
        &self,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Vec<Arc<dyn Policy>> {
        [
            self.retry.build(class, config),
            self.max_concurrency.build(class, config),
            self.server_throttle.build(class, config),
            self.client_throttle.build(class, config),
            self.request_timeout.build(class, config),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Composes a fresh wrapper on every call around cached components.
pub struct PipelineBuilder {
    config: Arc<dyn ConfigSource>,
    components: Components,
}

impl PipelineBuilder {
    pub fn new(config: impl ConfigSource + 'static) -> Self {
        Self {
            config: Arc::new(config),
            components: Components::new(),
        }
    }
}

impl PolicyPipeline for PipelineBuilder {
    fn get_policies_for(&self, class: RequestClassification) -> Arc<ComposedPolicy> {
        let config = self.config.current();
        Arc::new(ComposedPolicy::new(self.components.resolve(class, &config)))
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("components", &self.components)
            .finish()
    }
}

/// Like [`PipelineBuilder`], but also memoizes the composed wrapper.
pub struct CachedPipelineBuilder {
    config: Arc<dyn ConfigSource>,
    components: Components,
    composed: DashMap<RequestClassification, Arc<ComposedPolicy>>,
}

impl CachedPipelineBuilder {
    pub fn new(config: impl ConfigSource + 'static) -> Self {
        Self {
            config: Arc::new(config),
            components: Components::new(),
            composed: DashMap::new(),
        }
    }
}

impl PolicyPipeline for CachedPipelineBuilder {
    fn get_policies_for(&self, class: RequestClassification) -> Arc<ComposedPolicy> {
        let config = self.config.current();
        let layers = self.components.resolve(class, &config);

        let mut entry = self
            .composed
            .entry(class)
            .or_insert_with(|| Arc::new(ComposedPolicy::new(layers.clone())));
        if !entry.same_layers(&layers) {
            *entry = Arc::new(ComposedPolicy::new(layers));
        }
        Arc::clone(&entry)
    }
}

impl std::fmt::Debug for CachedPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPipelineBuilder")
            .field("components", &self.components)
            .field("composed", &self.composed.len())
            .finish()
    }
}
