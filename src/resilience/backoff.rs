//! Backoff curves from configured wait lists.

use std::time::Duration;

use http::header::{HeaderMap, RETRY_AFTER};

/// An explicit backoff curve: entry `k` is the wait before retry `k + 1`.
///
/// No jitter and no exponent; the list itself is the curve.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackoffCurve {
    intervals: Vec<Duration>,
}

impl BackoffCurve {
    pub fn new(intervals: Vec<Duration>) -> Self {
        Self { intervals }
    }

    /// Number of retries the curve allows.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }

    /// Wait before retry `attempt` (0-based), `None` once the curve is exhausted.
    pub fn delay(&self, attempt: usize) -> Option<Duration> {
        self.intervals.get(attempt).copied()
    }

    /// Like [`delay`](Self::delay) but repeats the last interval forever.
    pub fn delay_saturating(&self, attempt: usize) -> Option<Duration> {
        self.intervals
            .get(attempt)
            .or_else(|| self.intervals.last())
            .copied()
    }
}

/// Parse a `Retry-After` header given as delta seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn curve() -> BackoffCurve {
        BackoffCurve::new(vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
        ])
    }

    #[test]
    fn test_delay_follows_list() {
        let c = curve();
        assert_eq!(c.len(), 3);
        assert_eq!(c.delay(0), Some(Duration::from_millis(100)));
        assert_eq!(c.delay(2), Some(Duration::from_millis(400)));
        assert_eq!(c.delay(3), None);
    }

    #[test]
    fn test_delay_saturating_repeats_last() {
        let c = curve();
        assert_eq!(c.delay_saturating(10), Some(Duration::from_millis(400)));
        assert_eq!(BackoffCurve::default().delay_saturating(0), None);
    }

    #[test]
    fn test_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 7 "));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }
}
