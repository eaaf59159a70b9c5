//! Client-side throughput shaping with a token bucket.

use std::any::Any;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use crate::config::ThrottleBudget;
use crate::http::request::TrafficClass;
use crate::http::transport::Response;
use crate::observability::metrics;
use crate::resilience::error::{ResilienceError, ResilienceResult};
use crate::resilience::policy::{Next, Policy, PolicyKind};

/// A token bucket refilled one whole token per period.
#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Take one token, or report how long until the next one.
    fn try_acquire(&mut self, capacity: u32, period: Duration) -> Result<(), Duration> {
        let now = Instant::now();

        if self.tokens >= capacity {
            // A full bucket does not bank refill time.
            self.last_refill = now;
        } else {
            let elapsed = now.duration_since(self.last_refill);
            let earned = elapsed.as_nanos() / period.as_nanos();
            let added = earned.min(u128::from(capacity - self.tokens)) as u32;
            if added > 0 {
                self.tokens += added;
                self.last_refill = if self.tokens == capacity {
                    now
                } else {
                    self.last_refill + period * added
                };
            }
        }

        if self.tokens > 0 {
            self.tokens -= 1;
            Ok(())
        } else {
            Err(period.saturating_sub(now.duration_since(self.last_refill)))
        }
    }
}

/// Rate limiter for one traffic class.
///
/// Shared by every request of its class; a full bucket means immediate
/// rejection, never queueing.
#[derive(Debug)]
pub struct ClientThrottle {
    class: TrafficClass,
    capacity: u32,
    period: Duration,
    bucket: Mutex<TokenBucket>,
}

impl ClientThrottle {
    /// Returns `None` for a budget that cannot admit anything.
    pub fn new(class: TrafficClass, budget: ThrottleBudget) -> Option<Self> {
        let period = budget.refill_period()?.max(Duration::from_nanos(1));
        if budget.max_burst == 0 {
            return None;
        }
        Some(Self {
            class,
            capacity: budget.max_burst,
            period,
            bucket: Mutex::new(TokenBucket::new(budget.max_burst)),
        })
    }

    pub fn class(&self) -> TrafficClass {
        self.class
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_period(&self) -> Duration {
        self.period
    }

    /// Take a token for one request.
    pub fn try_acquire(&self) -> ResilienceResult<()> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket
            .try_acquire(self.capacity, self.period)
            .map_err(|retry_after| ResilienceError::RateLimited {
                class: self.class,
                retry_after,
            })
    }
}

impl Policy for ClientThrottle {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ClientThrottle
    }

    fn execute<'a>(&'a self, next: Next<'a>) -> BoxFuture<'a, ResilienceResult<Response>> {
        Box::pin(async move {
            if let Err(e) = self.try_acquire() {
                tracing::warn!(class = %self.class, error = %e, "Client throttle rejected request");
                metrics::record_rejection("rate_limit");
                return Err(e);
            }
            next.run().await
        })
    }

    fn describe(&self) -> String {
        format!(
            "class={} burst={} refill_every={:?}",
            self.class, self.capacity, self.period
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::testing::{get, run_layers, ScriptedTransport, Step};
    use std::sync::Arc;

    fn throttle(max_requests: u32, interval_ms: u64, max_burst: u32) -> ClientThrottle {
        ClientThrottle::new(
            TrafficClass::Read,
            ThrottleBudget {
                max_requests,
                interval_ms,
                max_burst,
            },
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_reject() {
        let t = throttle(10, 1_000, 3);
        assert_eq!(t.refill_period(), Duration::from_millis(100));

        for _ in 0..3 {
            assert!(t.try_acquire().is_ok());
        }
        match t.try_acquire() {
            Err(ResilienceError::RateLimited { class, retry_after }) => {
                assert_eq!(class, TrafficClass::Read);
                assert_eq!(retry_after, Duration::from_millis(100));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_one_token_per_period() {
        let t = throttle(10, 1_000, 2);
        assert!(t.try_acquire().is_ok());
        assert!(t.try_acquire().is_ok());
        assert!(t.try_acquire().is_err());

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(t.try_acquire().is_ok());
        assert!(t.try_acquire().is_err());

        // Remainder of the previous period carries over.
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(t.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_caps_at_capacity() {
        let t = throttle(10, 1_000, 2);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(t.try_acquire().is_ok());
        assert!(t.try_acquire().is_ok());
        assert!(t.try_acquire().is_err());
    }

    #[test]
    fn test_degenerate_budget_builds_nothing() {
        let zero_requests = ThrottleBudget {
            max_requests: 0,
            interval_ms: 1_000,
            max_burst: 1,
        };
        assert!(ClientThrottle::new(TrafficClass::Publish, zero_requests).is_none());

        let zero_burst = ThrottleBudget {
            max_requests: 1,
            max_burst: 0,
            ..zero_requests
        };
        assert!(ClientThrottle::new(TrafficClass::Publish, zero_burst).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_skips_transport() {
        let layers: Vec<Arc<dyn Policy>> = vec![Arc::new(throttle(1, 60_000, 1))];
        let transport = ScriptedTransport::always(Step::Status(200));

        assert!(run_layers(&layers, transport.as_ref(), &get()).await.is_ok());
        let err = run_layers(&layers, transport.as_ref(), &get()).await.unwrap_err();
        assert!(matches!(err, ResilienceError::RateLimited { .. }));
        assert_eq!(transport.calls(), 1);
    }
}
