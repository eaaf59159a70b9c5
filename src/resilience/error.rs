//! Error taxonomy for transports and the resilience pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::http::request::{TrafficClass, TransferClass};

/// Boxed error for causes we do not interpret.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors a transport can raise for a single send.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established or was lost.
    #[error("connection failed: {0}")]
    Connection(#[source] BoxError),

    /// The caller cancelled the send.
    #[error("request cancelled")]
    Cancelled,

    /// Anything else. Never retried.
    #[error(transparent)]
    Other(BoxError),
}

/// The single typed failure a caller sees from a composed policy.
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Connection-level transport failure.
    #[error("connection failed: {0}")]
    Connection(#[source] BoxError),

    /// An attempt exceeded its deadline.
    #[error("{transfer} request timed out after {after:?}")]
    Timeout {
        after: Duration,
        transfer: TransferClass,
    },

    /// The concurrency gate and its queue are both full.
    #[error("request rejected: {max_concurrent} executing and {max_queued} queued")]
    AdmissionRejected {
        max_concurrent: usize,
        max_queued: usize,
    },

    /// The client throttle bucket for this traffic class is empty.
    #[error("{class} rate limit exceeded, next token in {retry_after:?}")]
    RateLimited {
        class: TrafficClass,
        retry_after: Duration,
    },

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// Unclassified transport failure.
    #[error(transparent)]
    Transport(BoxError),
}

impl ResilienceError {
    /// Whether the generic retry layer may try again after this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResilienceError::Connection(_) | ResilienceError::Timeout { .. }
        )
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResilienceError::Connection(_) => "connection",
            ResilienceError::Timeout { .. } => "timeout",
            ResilienceError::AdmissionRejected { .. } => "admission",
            ResilienceError::RateLimited { .. } => "rate_limit",
            ResilienceError::Cancelled => "cancelled",
            ResilienceError::Transport(_) => "transport",
        }
    }
}

impl From<TransportError> for ResilienceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(e) => ResilienceError::Connection(e),
            TransportError::Cancelled => ResilienceError::Cancelled,
            TransportError::Other(e) => ResilienceError::Transport(e),
        }
    }
}

/// Result type for pipeline executions.
pub type ResilienceResult<T> = Result<T, ResilienceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ResilienceError::Connection("refused".into()).is_transient());
        assert!(ResilienceError::Timeout {
            after: Duration::from_secs(1),
            transfer: TransferClass::Standard,
        }
        .is_transient());

        assert!(!ResilienceError::Cancelled.is_transient());
        assert!(!ResilienceError::Transport("bad body".into()).is_transient());
        assert!(!ResilienceError::AdmissionRejected {
            max_concurrent: 1,
            max_queued: 0
        }
        .is_transient());
        assert!(!ResilienceError::RateLimited {
            class: TrafficClass::Read,
            retry_after: Duration::ZERO,
        }
        .is_transient());
    }

    #[test]
    fn test_from_transport_error() {
        let err: ResilienceError = TransportError::Cancelled.into();
        assert!(matches!(err, ResilienceError::Cancelled));

        let err: ResilienceError = TransportError::Connection("reset".into()).into();
        assert_eq!(err.kind(), "connection");

        let err: ResilienceError = TransportError::Other("weird".into()).into();
        assert_eq!(err.to_string(), "weird");
    }

    #[test]
    fn test_error_display() {
        let err = ResilienceError::Timeout {
            after: Duration::from_secs(3),
            transfer: TransferClass::FileTransfer,
        };
        assert_eq!(err.to_string(), "file_transfer request timed out after 3s");
    }
}
