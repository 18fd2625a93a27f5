#[cfg(test)]
mod tests {
    use crate::{
        api, rate_limiter, AuthState, RedditClient, RedditOAuth2Config, RetryExecutor,
        RetryPolicy,
    };
    use chorus_core::{CoreError, RedditApiError};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn create_test_config() -> RedditOAuth2Config {
        RedditOAuth2Config::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "chorus_bot".to_string(),
            "hunter2".to_string(),
            "chorus/0.1 by u/chorus_bot".to_string(),
        )
    }

    #[test]
    fn test_config_creation() {
        let config = create_test_config();
        assert_eq!(config.client_id, "test_client_id");
        assert_eq!(config.client_secret, "test_client_secret");
        assert_eq!(config.username, "chorus_bot");
        assert_eq!(config.user_agent, "chorus/0.1 by u/chorus_bot");
    }

    #[test]
    fn test_client_starts_unauthenticated() {
        let client = RedditClient::new(create_test_config()).unwrap();
        assert!(matches!(
            client.get_auth_state(),
            AuthState::NotAuthenticated
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_reply_is_retried_once() {
        let executor = RetryExecutor::new(RetryPolicy::reply_rate_limit_with_delay(Duration::ZERO));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = executor
            .execute("reply", move || async move {
                let body = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    json!({"json": {"errors": [["RATELIMIT", "you are doing that too much. try again in 7 minutes.", "ratelimit"]]}})
                } else {
                    json!({"json": {"errors": [], "data": {"things": [{"kind": "t1", "data": {"name": "t1_reply"}}]}}})
                };
                api::interpret_comment_response(&body).map_err(CoreError::from)
            })
            .await;

        assert_eq!(result.unwrap(), "t1_reply");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_rate_limit_propagates() {
        let executor = RetryExecutor::new(RetryPolicy::reply_rate_limit_with_delay(Duration::ZERO));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<String, CoreError> = executor
            .execute("reply", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let body = json!({"json": {"errors": [["RATELIMIT", "try again in 2 seconds.", "ratelimit"]]}});
                api::interpret_comment_response(&body).map_err(CoreError::from)
            })
            .await;

        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 2 }))
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_reply_errors_are_not_retried() {
        let executor = RetryExecutor::new(RetryPolicy::reply_rate_limit_with_delay(Duration::ZERO));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<String, CoreError> = executor
            .execute("reply", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let body = json!({"json": {"errors": [["THREAD_LOCKED", "that thread is locked", "parent"]]}});
                api::interpret_comment_response(&body).map_err(CoreError::from)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_burst_is_flagged_near_limit() {
        let limiter = rate_limiter::RateLimiter::new(rate_limiter::RateLimitConfig::reddit_oauth());

        tokio_test::block_on(async {
            for _ in 0..9 {
                limiter.acquire_permit().await;
            }
            let status = limiter.get_rate_limit_status().await;
            assert!(status.utilization_percentage() > 80.0);
            assert!(status.is_near_limit());
        });
    }
}
