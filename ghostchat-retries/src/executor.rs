//! Retry executor for running operations under a [`RetryPolicy`].

use crate::config::RetryPolicy;
use crate::error::{NetworkError, NetworkResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// State of a retried operation.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Attempts made so far (1-indexed once started).
    pub attempt: u32,
    /// Last error message.
    pub last_error: Option<String>,
    /// Total time spent waiting.
    pub total_wait_time: Duration,
    /// One entry per attempt.
    pub history: Vec<AttemptInfo>,
}

impl RetryState {
    /// Waits performed between attempts, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.history
            .iter()
            .map(|a| a.wait_after)
            .filter(|w| !w.is_zero())
            .collect()
    }
}

/// Information about a single attempt.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Attempt number.
    pub attempt: u32,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Time waited after this attempt before the next one.
    pub wait_after: Duration,
}

/// Execute an operation with retries.
///
/// A retryable failure (HTTP 429 by default) waits
/// `base_delay * backoff_factor^retry` and tries again, up to `max_retries`
/// times. Once the budget is spent a rate-limit failure is reported as
/// [`NetworkError::RateLimited`] without a further wait. Non-retryable errors
/// are returned immediately.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> NetworkResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = NetworkResult<T>>,
{
    with_retry_state(policy, operation).await.0
}

/// Execute with retries and get state information.
pub async fn with_retry_state<F, Fut, T>(
    policy: &RetryPolicy,
    operation: F,
) -> (NetworkResult<T>, RetryState)
where
    F: Fn() -> Fut,
    Fut: Future<Output = NetworkResult<T>>,
{
    let mut state = RetryState::default();

    loop {
        state.attempt += 1;
        let retry_count = state.attempt - 1;

        debug!(
            attempt = state.attempt,
            max_retries = policy.max_retries,
            "Executing attempt"
        );

        match operation().await {
            Ok(result) => {
                state.history.push(AttemptInfo {
                    attempt: state.attempt,
                    success: true,
                    error: None,
                    wait_after: Duration::ZERO,
                });
                return (Ok(result), state);
            }
            Err(error) => {
                state.last_error = Some(error.to_string());
                let retryable = policy.retry_on.should_retry(&error);

                if !retryable || retry_count >= policy.max_retries {
                    state.history.push(AttemptInfo {
                        attempt: state.attempt,
                        success: false,
                        error: Some(error.to_string()),
                        wait_after: Duration::ZERO,
                    });

                    let error = if retryable && error.is_rate_limit() {
                        NetworkError::RateLimited {
                            attempts: state.attempt,
                        }
                    } else {
                        error
                    };

                    warn!(
                        attempt = state.attempt,
                        error = %error,
                        "Retry exhausted or error not retryable"
                    );
                    return (Err(error), state);
                }

                let wait = policy.delay_for(retry_count);
                state.total_wait_time += wait;
                state.history.push(AttemptInfo {
                    attempt: state.attempt,
                    success: false,
                    error: Some(error.to_string()),
                    wait_after: wait,
                });

                debug!(
                    attempt = state.attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "Waiting before retry"
                );

                sleep(wait).await;
            }
        }
    }
}
