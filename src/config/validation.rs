//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (status codes, budgets, retry-after bounds, timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResilienceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Disabled sections are not range-checked

use thiserror::Error;

use crate::config::schema::{ResilienceConfig, ThrottleBudget};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("retry.status_codes contains {0}, expected 100..=599")]
    InvalidStatusCode(u16),

    #[error("concurrency.max_concurrent_requests must be at least 1")]
    ZeroConcurrency,

    #[error("client_throttle.{class}.{field} must be at least 1")]
    DegenerateBudget {
        class: &'static str,
        field: &'static str,
    },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("server_throttle.min_retry_after_ms ({min}) exceeds max_retry_after_ms ({max})")]
    InvertedRetryAfterBounds { min: u64, max: u64 },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for &code in &config.retry.status_codes {
        if !(100..=599).contains(&code) {
            errors.push(ValidationError::InvalidStatusCode(code));
        }
    }

    let throttle = &config.server_throttle;
    if throttle.enabled
        && throttle.honor_retry_after
        && throttle.min_retry_after_ms > throttle.max_retry_after_ms
    {
        errors.push(ValidationError::InvertedRetryAfterBounds {
            min: throttle.min_retry_after_ms,
            max: throttle.max_retry_after_ms,
        });
    }

    if config.concurrency.enabled && config.concurrency.max_concurrent_requests == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }

    if config.client_throttle.enabled {
        check_budget("read", &config.client_throttle.read, &mut errors);
        check_budget("publish", &config.client_throttle.publish, &mut errors);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.file_transfer_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("file_transfer_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_budget(class: &'static str, budget: &ThrottleBudget, errors: &mut Vec<ValidationError>) {
    let fields = [
        ("max_requests", u64::from(budget.max_requests)),
        ("interval_ms", budget.interval_ms),
        ("max_burst", u64::from(budget.max_burst)),
    ];
    for (field, value) in fields {
        if value == 0 {
            errors.push(ValidationError::DegenerateBudget { class, field });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ResilienceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ResilienceConfig::default();
        config.retry.status_codes = vec![503, 42];
        config.concurrency.max_concurrent_requests = 0;
        config.client_throttle.enabled = true;
        config.client_throttle.publish.max_burst = 0;
        config.timeouts.file_transfer_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidStatusCode(42),
                ValidationError::ZeroConcurrency,
                ValidationError::DegenerateBudget {
                    class: "publish",
                    field: "max_burst"
                },
                ValidationError::ZeroTimeout("file_transfer_secs"),
            ]
        );
    }

    #[test]
    fn test_inverted_retry_after_bounds() {
        let mut config = ResilienceConfig::default();
        config.server_throttle.min_retry_after_ms = 10_000;
        config.server_throttle.max_retry_after_ms = 1_000;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvertedRetryAfterBounds {
                min: 10_000,
                max: 1_000
            }]
        );

        config.server_throttle.honor_retry_after = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_disabled_sections_are_not_checked() {
        let mut config = ResilienceConfig::default();
        config.concurrency.enabled = false;
        config.concurrency.max_concurrent_requests = 0;
        config.client_throttle.enabled = false;
        config.client_throttle.read.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::DegenerateBudget {
            class: "read",
            field: "interval_ms",
        };
        assert_eq!(err.to_string(), "client_throttle.read.interval_ms must be at least 1");
    }
}
