use chorus_core::{CoreError, RedditApiError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Decides whether a failed attempt is worth repeating.
pub type RetryPredicate = fn(&CoreError) -> bool;

/// Configuration for retry behavior
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied per retry; 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
    pub retry_on: RetryPredicate,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter_factor", &self.jitter_factor)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Policy for submitting replies: Reddit's RATELIMIT error gets exactly
    /// one more attempt after a fixed seven minute pause.
    pub fn reply_rate_limit() -> Self {
        Self::reply_rate_limit_with_delay(Duration::from_secs(7 * 60))
    }

    pub fn reply_rate_limit_with_delay(delay: Duration) -> Self {
        Self {
            max_attempts: 2,
            base_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            retry_on: is_rate_limit,
        }
    }
}

pub fn is_rate_limit(error: &CoreError) -> bool {
    matches!(
        error,
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { .. })
            | CoreError::RateLimited { .. }
    )
}

/// Delay before retry number `attempt + 1`, with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let base_ms = policy.base_delay.as_millis() as f64;
    let max_ms = policy.max_delay.as_millis() as u64;

    let exponential_ms = (base_ms * policy.backoff_multiplier.powi(attempt as i32)) as u64;
    let exponential_delay = Duration::from_millis(exponential_ms.min(max_ms));

    let jitter_range = (exponential_delay.as_millis() as f64 * policy.jitter_factor) as u64;
    let jitter = if jitter_range == 0 {
        0
    } else {
        fastrand::u64(0..=jitter_range)
    };

    (exponential_delay + Duration::from_millis(jitter)).min(policy.max_delay)
}

/// Retry executor that wraps operations with retry logic
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `operation` until it succeeds, fails with an error the policy does
    /// not retry, or runs out of attempts. The last error is returned as is.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation_name);
            }

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("Operation {} succeeded after {} retries", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            if !(self.policy.retry_on)(&error) {
                debug!("Not retrying {} due to error type: {}", operation_name, error);
                return Err(error);
            }

            if attempt + 1 >= self.policy.max_attempts {
                error!(
                    "Operation {} failed after {} attempts: {}",
                    operation_name,
                    attempt + 1,
                    error
                );
                return Err(error);
            }

            let delay = calculate_delay(attempt, &self.policy);
            warn!("Retrying {} in {:?} due to: {}", operation_name, delay, error);
            sleep(delay).await;
            attempt += 1;
        }
    }
}
