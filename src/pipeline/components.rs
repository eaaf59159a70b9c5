//! Component builders: one per pipeline layer.
//!
//! Each builder turns the current config (and the request's classification)
//! into a policy, or `None` when its layer is disabled. Each also names the
//! exact config fields it reads as its cache key, and the classification
//! partition its policy belongs to.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    ConcurrencyConfig, ResilienceConfig, RetryConfig, ServerThrottleConfig, ThrottleBudget,
};
use crate::http::request::{RequestClassification, TrafficClass, TransferClass};
use crate::resilience::{
    BackoffCurve, ClientThrottle, ConcurrencyLimiter, Policy, PolicyKind, RequestTimeout,
    RetryAfterBounds, RetryPolicy, ServerThrottlePolicy, StatusPredicate,
};

/// Which cached instance a classification maps to.
///
/// Components that do not depend on the classification share one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Shared,
    Traffic(TrafficClass),
    Transfer(TransferClass),
}

/// Builds one layer of the pipeline.
pub trait PolicyComponentBuilder: Send + Sync {
    /// The config fields this component reads. Compared by value.
    type Key: PartialEq + Send + Sync + std::fmt::Debug;

    fn kind(&self) -> PolicyKind;

    fn partition(&self, _class: RequestClassification) -> Partition {
        Partition::Shared
    }

    fn cache_key(&self, class: RequestClassification, config: &ResilienceConfig) -> Self::Key;

    fn build(
        &self,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>>;
}

/// Generic transient-fault retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryBuilder;

impl PolicyComponentBuilder for RetryBuilder {
    type Key = RetryConfig;

    fn kind(&self) -> PolicyKind {
        PolicyKind::Retry
    }

    fn cache_key(&self, _class: RequestClassification, config: &ResilienceConfig) -> RetryConfig {
        config.retry.clone()
    }

    fn build(
        &self,
        _class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        let retry = &config.retry;
        if !retry.enabled || retry.intervals_ms.is_empty() {
            return None;
        }
        Some(Arc::new(RetryPolicy::new(
            BackoffCurve::new(retry.intervals()),
            StatusPredicate::from_overrides(&retry.status_codes),
        )))
    }
}

/// Server-signaled overload (HTTP 429).
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerThrottleBuilder;

impl PolicyComponentBuilder for ServerThrottleBuilder {
    type Key = ServerThrottleConfig;

    fn kind(&self) -> PolicyKind {
        PolicyKind::ServerThrottle
    }

    fn cache_key(
        &self,
        _class: RequestClassification,
        config: &ResilienceConfig,
    ) -> ServerThrottleConfig {
        config.server_throttle.clone()
    }

    fn build(
        &self,
        _class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        let throttle = &config.server_throttle;
        if !throttle.enabled || throttle.intervals_ms.is_empty() {
            return None;
        }
        let (min, max) = throttle.retry_after_bounds();
        Some(Arc::new(ServerThrottlePolicy::new(
            BackoffCurve::new(throttle.intervals()),
            throttle.limit_retries,
            throttle
                .honor_retry_after
                .then(|| RetryAfterBounds::new(min, max)),
        )))
    }
}

/// Concurrency admission gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxConcurrencyBuilder;

impl PolicyComponentBuilder for MaxConcurrencyBuilder {
    type Key = ConcurrencyConfig;

    fn kind(&self) -> PolicyKind {
        PolicyKind::MaxConcurrency
    }

    fn cache_key(
        &self,
        _class: RequestClassification,
        config: &ResilienceConfig,
    ) -> ConcurrencyConfig {
        config.concurrency.clone()
    }

    fn build(
        &self,
        _class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        let concurrency = &config.concurrency;
        if !concurrency.enabled {
            return None;
        }
        Some(Arc::new(ConcurrencyLimiter::new(
            concurrency.max_concurrent_requests,
            concurrency.max_queued_requests,
        )))
    }
}

/// Client-side token bucket, one per traffic class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientThrottleBuilder;

fn budget_for(class: TrafficClass, config: &ResilienceConfig) -> ThrottleBudget {
    match class {
        TrafficClass::Read => config.client_throttle.read,
        TrafficClass::Publish => config.client_throttle.publish,
    }
}

impl PolicyComponentBuilder for ClientThrottleBuilder {
    type Key = (bool, ThrottleBudget);

    fn kind(&self) -> PolicyKind {
        PolicyKind::ClientThrottle
    }

    fn partition(&self, class: RequestClassification) -> Partition {
        Partition::Traffic(class.traffic())
    }

    fn cache_key(
        &self,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> (bool, ThrottleBudget) {
        (
            config.client_throttle.enabled,
            budget_for(class.traffic(), config),
        )
    }

    fn build(
        &self,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        if !config.client_throttle.enabled {
            return None;
        }
        let traffic = class.traffic();
        let Some(throttle) = ClientThrottle::new(traffic, budget_for(traffic, config)) else {
            tracing::warn!(class = %traffic, "Client throttle budget admits nothing, skipping layer");
            return None;
        };
        Some(Arc::new(throttle))
    }
}

/// Per-attempt timeout, chosen by transfer class. Always produces a policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestTimeoutBuilder;

impl PolicyComponentBuilder for RequestTimeoutBuilder {
    type Key = Duration;

    fn kind(&self) -> PolicyKind {
        PolicyKind::RequestTimeout
    }

    fn partition(&self, class: RequestClassification) -> Partition {
        Partition::Transfer(class.transfer())
    }

    fn cache_key(&self, class: RequestClassification, config: &ResilienceConfig) -> Duration {
        match class.transfer() {
            TransferClass::Standard => config.timeouts.request(),
            TransferClass::FileTransfer => config.timeouts.file_transfer(),
        }
    }

    fn build(
        &self,
        class: RequestClassification,
        config: &ResilienceConfig,
    ) -> Option<Arc<dyn Policy>> {
        Some(Arc::new(RequestTimeout::new(
            self.cache_key(class, config),
            class.transfer(),
        )))
    }
}
