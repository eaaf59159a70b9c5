//! Configuration schema definitions.
//!
//! This module defines the complete set of resilience tunables.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the resilience pipeline.
///
/// A value of this type is an immutable snapshot: the pipeline reads a fresh
/// one from its [`ConfigSource`](crate::config::ConfigSource) on every build.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Generic transient-fault retry settings.
    pub retry: RetryConfig,

    /// Retry settings for server-signaled overload (HTTP 429).
    pub server_throttle: ServerThrottleConfig,

    /// Concurrency admission (bulkhead) settings.
    pub concurrency: ConcurrencyConfig,

    /// Client-side throughput shaping.
    pub client_throttle: ClientThrottleConfig,

    /// Per-request timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Generic retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Wait before each retry in milliseconds. One retry per entry.
    pub intervals_ms: Vec<u64>,

    /// Status codes that trigger a retry.
    /// Empty means the default predicate (408 and all 5xx).
    pub status_codes: Vec<u16>,
}

impl RetryConfig {
    /// The configured backoff curve.
    pub fn intervals(&self) -> Vec<Duration> {
        self.intervals_ms.iter().copied().map(Duration::from_millis).collect()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intervals_ms: vec![1_000, 3_000, 10_000],
            status_codes: Vec::new(),
        }
    }
}

/// Server throttle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerThrottleConfig {
    /// Enable server throttle handling.
    pub enabled: bool,

    /// Wait before each retry in milliseconds. The last entry repeats
    /// when retries are unbounded.
    pub intervals_ms: Vec<u64>,

    /// Cap the retry count at the number of intervals.
    pub limit_retries: bool,

    /// Prefer the server's `Retry-After` header over the configured interval.
    pub honor_retry_after: bool,

    /// Shortest wait taken on a `Retry-After` hint, in milliseconds.
    pub min_retry_after_ms: u64,

    /// Longest wait taken on a `Retry-After` hint, in milliseconds.
    pub max_retry_after_ms: u64,
}

impl ServerThrottleConfig {
    /// The configured backoff curve.
    pub fn intervals(&self) -> Vec<Duration> {
        self.intervals_ms.iter().copied().map(Duration::from_millis).collect()
    }

    /// Bounds a `Retry-After` hint is clamped into.
    pub fn retry_after_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_retry_after_ms),
            Duration::from_millis(self.max_retry_after_ms),
        )
    }
}

impl Default for ServerThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intervals_ms: vec![5_000, 10_000, 30_000],
            limit_retries: false,
            honor_retry_after: true,
            min_retry_after_ms: 1_000,
            max_retry_after_ms: 300_000,
        }
    }
}

/// Concurrency admission configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Enable the admission gate.
    pub enabled: bool,

    /// Maximum requests executing at once.
    pub max_concurrent_requests: usize,

    /// Maximum requests waiting for a slot. Beyond this, requests are rejected.
    pub max_queued_requests: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent_requests: 10,
            max_queued_requests: 1_000,
        }
    }
}

/// Client throttle configuration with one budget per traffic class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientThrottleConfig {
    /// Enable client-side rate limiting.
    pub enabled: bool,

    /// Budget for non-mutating requests.
    pub read: ThrottleBudget,

    /// Budget for mutating requests.
    pub publish: ThrottleBudget,
}

impl Default for ClientThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            read: ThrottleBudget {
                max_requests: 40_000,
                interval_ms: 3_600_000,
                max_burst: 100,
            },
            publish: ThrottleBudget {
                max_requests: 5_000,
                interval_ms: 3_600_000,
                max_burst: 20,
            },
        }
    }
}

/// A token bucket budget: `max_requests` per `interval_ms`, bursting up to `max_burst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ThrottleBudget {
    /// Requests permitted per interval.
    pub max_requests: u32,

    /// Interval length in milliseconds.
    pub interval_ms: u64,

    /// Bucket capacity.
    pub max_burst: u32,
}

impl ThrottleBudget {
    /// Time to refill a single token, or `None` for a degenerate budget.
    pub fn refill_period(&self) -> Option<Duration> {
        if self.max_requests == 0 || self.interval_ms == 0 {
            return None;
        }
        Some(Duration::from_millis(self.interval_ms) / self.max_requests)
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for a single attempt of a regular request, in seconds.
    pub request_secs: u64,

    /// Timeout for a single attempt of a file upload/download, in seconds.
    pub file_transfer_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn file_transfer(&self) -> Duration {
        Duration::from_secs(self.file_transfer_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 100,
            file_transfer_secs: 3_600,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
