//! Bounded retry for transport failures.

use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MIN_TIMEOUT: Duration = Duration::from_millis(100);
const MAX_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: u32 = 60;

/// How often and how patiently a request is attempted.
///
/// Only transport failures (connection errors, timeouts) are retried. Attempt `n`
/// that fails waits `n * backoff` before attempt `n + 1`.
///
/// ```
/// use std::time::Duration;
/// use fbgraph_common::retry::RetryPolicy;
///
/// let policy = RetryPolicy::new()
///     .timeout(Duration::from_secs(3))
///     .max_attempts(2)
///     .build();
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(start_fn = new)]
#[serde(try_from = "RawRetryPolicy", into = "RawRetryPolicy")]
pub struct RetryPolicy {
    /// Time bound on each attempt
    #[builder(default = Duration::from_millis(1500))]
    pub timeout: Duration,
    /// Total number of attempts, including the first
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Linear backoff step between attempts
    #[builder(default = Duration::from_secs(1))]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new().build()
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self::new().max_attempts(1).build()
    }

    /// Check every setting against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&self.timeout) {
            return Err(ConfigError::OutOfRange {
                name: "timeout",
                value: format!("{:?}", self.timeout),
                min: format!("{:?}", MIN_TIMEOUT),
                max: format!("{:?}", MAX_TIMEOUT),
            });
        }
        if !(1..=MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(ConfigError::OutOfRange {
                name: "max_attempts",
                value: self.max_attempts.to_string(),
                min: "1".into(),
                max: MAX_ATTEMPTS.to_string(),
            });
        }
        Ok(())
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Wire form of [`RetryPolicy`], with durations in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct RawRetryPolicy {
    timeout_ms: u64,
    max_attempts: u32,
    backoff_ms: u64,
}

impl Default for RawRetryPolicy {
    fn default() -> Self {
        RetryPolicy::default().into()
    }
}

impl From<RetryPolicy> for RawRetryPolicy {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            timeout_ms: policy.timeout.as_millis() as u64,
            max_attempts: policy.max_attempts,
            backoff_ms: policy.backoff.as_millis() as u64,
        }
    }
}

impl TryFrom<RawRetryPolicy> for RetryPolicy {
    type Error = ConfigError;

    fn try_from(raw: RawRetryPolicy) -> Result<Self, Self::Error> {
        let policy = RetryPolicy::new()
            .timeout(Duration::from_millis(raw.timeout_ms))
            .max_attempts(raw.max_attempts)
            .backoff(Duration::from_millis(raw.backoff_ms))
            .build();
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.timeout, Duration::from_millis(1500));
        assert_eq!(policy.max_attempts, 5);
        assert!(policy.validate().is_ok());
        assert_eq!(policy.delay_after(3), Duration::from_secs(3));
    }

    #[test]
    fn rejects_out_of_range() {
        let too_fast = RetryPolicy::new().timeout(Duration::from_millis(50)).build();
        assert!(matches!(
            too_fast.validate(),
            Err(ConfigError::OutOfRange { name: "timeout", .. })
        ));
        let zero = RetryPolicy::new().max_attempts(0).build();
        assert!(zero.validate().is_err());
        let many = RetryPolicy::new().max_attempts(61).build();
        assert!(many.validate().is_err());
    }

    #[test]
    fn reads_millisecond_json() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"timeout_ms": 250, "max_attempts": 2}"#).unwrap();
        assert_eq!(policy.timeout, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.backoff, Duration::from_secs(1));

        let bad = serde_json::from_str::<RetryPolicy>(r#"{"timeout_ms": 120000}"#);
        assert!(bad.is_err());
    }
}
