use super::error::{ErrorRetryStrategy, VendorResult};
use std::future::Future;
use std::time::Duration;

/// Retry policy for vendor calls
///
/// Only errors classified as [`ErrorRetryStrategy::Retry`] are retried; the
/// wait doubles after every failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Max attempts before failure
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Backoff before attempt `attempt + 1` (1-based failed attempt count)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2_u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Execute an operation with automatic retry logic
    pub async fn execute<T, F, Fut>(&self, description: &str, mut operation: F) -> VendorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = VendorResult<T>>,
    {
        let mut attempt_count = 0;

        loop {
            tracing::debug!(
                "Calling {} (attempt {}/{})",
                description,
                attempt_count + 1,
                self.max_attempts
            );

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => match e.to_retry_strategy() {
                    ErrorRetryStrategy::Fail => {
                        tracing::debug!("Permanent error for {}: {}", description, e);
                        return Err(e);
                    }
                    ErrorRetryStrategy::Retry => {
                        attempt_count += 1;
                        if attempt_count >= self.max_attempts {
                            tracing::error!(
                                "Max attempts ({}) exceeded for {}: {}",
                                self.max_attempts,
                                description,
                                e
                            );
                            return Err(e);
                        }

                        let backoff = self.backoff(attempt_count);
                        tracing::warn!(
                            "Retrying {} (attempt {}/{}) after {:?}: {}",
                            description,
                            attempt_count,
                            self.max_attempts,
                            backoff,
                            e
                        );
                        tokio::time::sleep(backoff).await;
                    }
                },
            }
        }
    }
}
