use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Fixed attempt budget with a linearly growing delay between attempts.
///
/// The delay after attempt `n` is `n * base_delay`, so the default policy
/// waits 1s, then 2s, before the third and final attempt. No delay is added
/// after the last failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Delay to wait after the given 1-based attempt number.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `operation` until it succeeds or the policy's attempt budget is
/// exhausted, returning the final error in the latter case.
pub async fn with_backoff<F, Fut, T, E>(
    label: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = label, attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt < policy.attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    operation = label,
                    attempt,
                    error = %err,
                    "operation failed, attempt budget exhausted"
                );
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_immediately_on_first_success() {
        let mut calls = 0u32;
        let result: Result<u32, &str> =
            with_backoff("test_op", RetryPolicy::default(), || {
                calls += 1;
                async { Ok(42) }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_after_linear_delays() {
        let start = tokio::time::Instant::now();
        let mut calls = 0u32;
        let result: Result<u32, &str> =
            with_backoff("test_op", RetryPolicy::default(), || {
                calls += 1;
                let call = calls;
                async move {
                    if call < 3 {
                        Err("transient")
                    } else {
                        Ok(call)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
        // 1s after the first failure plus 2s after the second.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_budget_and_returns_last_error() {
        let start = tokio::time::Instant::now();
        let mut calls = 0u32;
        let result: Result<u32, String> =
            with_backoff("test_op", RetryPolicy::default(), || {
                calls += 1;
                let call = calls;
                async move { Err(format!("failure {call}")) }
            })
            .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls, 3);
        // No delay is added after the final failure.
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_single_attempt_policy_never_sleeps() {
        let mut calls = 0u32;
        let policy = RetryPolicy::new(1, Duration::from_secs(60));
        let result: Result<u32, &str> = with_backoff("test_op", policy, || {
            calls += 1;
            async { Err("hard down") }
        })
        .await;

        assert_eq!(result, Err("hard down"));
        assert_eq!(calls, 1);
    }
}
