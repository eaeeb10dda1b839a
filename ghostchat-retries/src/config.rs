//! Retry policy.

use crate::error::NetworkError;
use std::time::Duration;

/// Bounded exponential backoff, shared by every caller of the network client.
///
/// The wait before retry `n` (0-based) is `base_delay * backoff_factor^n`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied for each further retry.
    pub backoff_factor: f64,
    /// Upper bound for a single wait.
    pub max_delay: Option<Duration>,
    /// Which failures are retried.
    pub retry_on: RetryCondition,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(2000),
            backoff_factor: 2.0,
            max_delay: None,
            retry_on: RetryCondition::default(),
        }
    }
}

impl RetryPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Cap every wait.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set retry condition.
    pub fn retry_on(mut self, condition: RetryCondition) -> Self {
        self.retry_on = condition;
        self
    }

    /// Policy used for the chat endpoints.
    pub fn for_api() -> Self {
        Self::default()
    }

    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self::new().max_retries(0)
    }

    /// Wait before retry number `retry_count` (0-based).
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Condition for retrying.
#[derive(Debug, Clone)]
pub struct RetryCondition {
    /// HTTP status codes to retry on.
    pub on_status_codes: Vec<u16>,
    /// Custom predicate function.
    pub custom: Option<fn(&NetworkError) -> bool>,
}

impl Default for RetryCondition {
    fn default() -> Self {
        Self::new().on_rate_limit()
    }
}

impl RetryCondition {
    /// Create a condition that retries nothing.
    pub fn new() -> Self {
        Self {
            on_status_codes: Vec::new(),
            custom: None,
        }
    }

    /// Add status codes to retry on.
    pub fn on_status(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.on_status_codes.extend(codes);
        self
    }

    /// Retry on rate limit (429).
    pub fn on_rate_limit(mut self) -> Self {
        self.on_status_codes.push(429);
        self
    }

    /// Retry on server errors (5xx).
    pub fn on_server_errors(mut self) -> Self {
        self.on_status_codes.extend(500..=599);
        self
    }

    /// Set a custom predicate.
    pub fn with_custom(mut self, predicate: fn(&NetworkError) -> bool) -> Self {
        self.custom = Some(predicate);
        self
    }

    /// Check if an error should be retried.
    pub fn should_retry(&self, error: &NetworkError) -> bool {
        if let Some(predicate) = self.custom {
            return predicate(error);
        }

        error
            .status()
            .is_some_and(|status| self.on_status_codes.contains(&status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(8000));
    }

    #[test]
    fn test_max_delay_caps_wait() {
        let policy = RetryPolicy::new()
            .base_delay(Duration::from_secs(1))
            .backoff_factor(10.0)
            .max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
    }

    #[test]
    fn test_config_builder() {
        let policy = RetryPolicy::new()
            .max_retries(4)
            .base_delay(Duration::from_millis(250))
            .backoff_factor(4.0);

        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(RetryPolicy::no_retry().max_retries, 0);
    }

    #[test]
    fn test_default_condition_only_rate_limit() {
        let condition = RetryCondition::default();

        assert!(condition.should_retry(&NetworkError::rate_limited()));
        assert!(condition.should_retry(&NetworkError::http(429, "")));
        assert!(!condition.should_retry(&NetworkError::http(500, "")));
        assert!(!condition.should_retry(&NetworkError::http(404, "")));
        assert!(!condition.should_retry(&NetworkError::Timeout));
    }

    #[test]
    fn test_server_error_condition() {
        let condition = RetryCondition::default().on_server_errors();
        assert!(condition.should_retry(&NetworkError::http(503, "")));
        assert!(!condition.should_retry(&NetworkError::http(400, "")));
    }

    #[test]
    fn test_custom_condition() {
        let condition = RetryCondition::new().with_custom(|e| matches!(e, NetworkError::Timeout));
        assert!(condition.should_retry(&NetworkError::Timeout));
        assert!(!condition.should_retry(&NetworkError::rate_limited()));
    }
}
