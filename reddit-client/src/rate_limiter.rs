use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate,
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }

    /// Takes `tokens_needed` tokens, or returns how long until they are available.
    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens >= tokens_needed {
            state.tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - state.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }
}

/// Reddit's own accounting, read from the `x-ratelimit-*` response headers.
#[derive(Debug, Clone, Copy)]
struct ServerBudget {
    remaining: f64,
    resets_at: Instant,
}

/// Client-side token bucket, tightened by whatever budget Reddit reports.
#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    config: RateLimitConfig,
    server_budget: Mutex<Option<ServerBudget>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            token_bucket: TokenBucket::new(&config),
            config,
            server_budget: Mutex::new(None),
        }
    }

    /// Waits until a request may be sent. Returns the time spent waiting.
    pub async fn acquire_permit(&self) -> Duration {
        let start_time = Instant::now();

        let server_wait = {
            let budget = self.server_budget.lock().await;
            match *budget {
                Some(b) if b.remaining < 1.0 => b.resets_at.checked_duration_since(Instant::now()),
                _ => None,
            }
        };
        if let Some(wait) = server_wait {
            tracing::warn!("Reddit request budget exhausted, pausing {:?}", wait);
            sleep(wait).await;
            *self.server_budget.lock().await = None;
        }

        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        start_time.elapsed()
    }

    /// Records the `x-ratelimit-remaining` / `x-ratelimit-reset` values of a response.
    pub async fn observe_server_budget(&self, remaining: Option<f64>, reset_secs: Option<u64>) {
        if let (Some(remaining), Some(reset_secs)) = (remaining, reset_secs) {
            let mut budget = self.server_budget.lock().await;
            *budget = Some(ServerBudget {
                remaining,
                resets_at: Instant::now() + Duration::from_secs(reset_secs),
            });
        }
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let available_tokens = self.token_bucket.available_tokens().await;
        let budget = *self.server_budget.lock().await;

        RateLimitStatus {
            available_tokens: available_tokens as u32,
            max_tokens: self.config.burst_allowance,
            requests_per_minute: self.config.max_requests,
            server_remaining: budget.map(|b| b.remaining),
            server_reset_in: budget.map(|b| b.resets_at.saturating_duration_since(Instant::now())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub requests_per_minute: u32,
    pub server_remaining: Option<f64>,
    pub server_reset_in: Option<Duration>,
}

impl RateLimitStatus {
    /// Share of the client-side burst already spent.
    pub fn utilization_percentage(&self) -> f64 {
        let used_tokens = self.max_tokens.saturating_sub(self.available_tokens);
        (used_tokens as f64 / self.max_tokens as f64) * 100.0
    }

    pub fn is_near_limit(&self) -> bool {
        self.utilization_percentage() > 80.0 || self.server_remaining.is_some_and(|r| r < 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_bucket_basic() {
        let config = RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 5,
        };

        let bucket = TokenBucket::new(&config);

        // Should be able to acquire up to burst allowance
        for _ in 0..5 {
            assert!(bucket.acquire(1.0).await.is_ok());
        }

        // Next acquisition should fail
        assert!(bucket.acquire(1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_token_bucket_refill() {
        let config = RateLimitConfig {
            max_requests: 60, // 1 token per second
            time_window: Duration::from_secs(60),
            burst_allowance: 2,
        };

        let bucket = TokenBucket::new(&config);

        assert!(bucket.acquire(2.0).await.is_ok());
        assert!(bucket.acquire(1.0).await.is_err());

        sleep(Duration::from_millis(1100)).await;

        assert!(bucket.acquire(1.0).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_status() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        let status = limiter.get_rate_limit_status().await;
        assert_eq!(status.max_tokens, 10);
        assert_eq!(status.requests_per_minute, 100);
        assert!(status.server_remaining.is_none());
        assert!(!status.is_near_limit());

        limiter.acquire_permit().await;
        let status = limiter.get_rate_limit_status().await;
        assert!(status.available_tokens < 10);
    }

    #[tokio::test]
    async fn test_server_budget_is_recorded() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        limiter.observe_server_budget(Some(3.0), Some(120)).await;
        let status = limiter.get_rate_limit_status().await;
        assert_eq!(status.server_remaining, Some(3.0));
        assert!(status.server_reset_in.unwrap() <= Duration::from_secs(120));
        assert!(status.is_near_limit());

        // Partial header sets are ignored
        limiter.observe_server_budget(Some(1.0), None).await;
        let status = limiter.get_rate_limit_status().await;
        assert_eq!(status.server_remaining, Some(3.0));
    }

    #[tokio::test]
    async fn test_exhausted_server_budget_with_past_reset_does_not_block() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        limiter.observe_server_budget(Some(0.0), Some(0)).await;
        let waited = limiter.acquire_permit().await;
        assert!(waited < Duration::from_secs(1));
    }
}
