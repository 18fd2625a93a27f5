use crate::api::{ListingPager, RedditApiClient};
use crate::auth::{build_oauth_client, request_password_token, AuthState, RedditOAuth2Config, RedditToken};
use crate::platform::RedditPlatform;
use chorus_core::{Comment, CoreError, ErrorExt, RedditApiError, ThreadSummary};
use oauth2::basic::BasicClient;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct RedditClient {
    config: RedditOAuth2Config,
    oauth_client: BasicClient,
    token_http: reqwest::Client,
    api: RedditApiClient,
    auth_state: Mutex<AuthState>,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let oauth_client = build_oauth_client(&config)?;
        let token_http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;
        let api = RedditApiClient::new(config.user_agent.clone())?;

        Ok(Self {
            config,
            oauth_client,
            token_http,
            api,
            auth_state: Mutex::new(AuthState::NotAuthenticated),
        })
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.auth_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_auth_state(&self) -> AuthState {
        self.state().clone()
    }

    pub fn set_token(&self, token: RedditToken) {
        let new_state = if token.is_expired() {
            AuthState::TokenExpired { token }
        } else {
            AuthState::Authenticated { token }
        };
        *self.state() = new_state;
    }

    fn expire_token(&self) {
        let mut state = self.state();
        if let AuthState::Authenticated { token } = &*state {
            *state = AuthState::TokenExpired {
                token: token.clone(),
            };
        }
    }

    pub async fn authenticate(&self) -> Result<RedditToken, CoreError> {
        let token = request_password_token(&self.oauth_client, &self.token_http, &self.config).await?;
        self.set_token(token.clone());
        Ok(token)
    }

    /// A usable access token, fetching a new one when missing or expired.
    pub async fn ensure_authenticated(&self) -> Result<String, CoreError> {
        let current = match &*self.state() {
            AuthState::Authenticated { token } if !token.is_expired() => {
                Some(token.access_token.clone())
            }
            _ => None,
        };

        match current {
            Some(access_token) => Ok(access_token),
            None => {
                debug!("No valid Reddit token, authenticating");
                Ok(self.authenticate().await?.access_token)
            }
        }
    }

    /// Runs `operation` with an access token. A token Reddit rejects is
    /// replaced once before giving up.
    async fn authorized<T, F, Fut>(&self, operation: F) -> Result<T, CoreError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let access_token = self.ensure_authenticated().await?;
        match operation(access_token).await {
            Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                warn!("Reddit rejected the access token, re-authenticating");
                self.expire_token();
                let access_token = self.ensure_authenticated().await?;
                operation(access_token).await
            }
            other => other,
        }
    }
}

impl RedditPlatform for RedditClient {
    async fn login(&self) -> Result<Option<String>, CoreError> {
        self.authenticate().await?;

        let me = self
            .authorized(move |token| async move { self.api.get_user_info(&token).await })
            .await;

        match me {
            Ok(user) => {
                info!("Logged in as u/{}", user.name);
                Ok(Some(user.name))
            }
            Err(e) => {
                warn!("Could not confirm the Reddit identity, continuing anyway");
                e.log_warn();
                Ok(None)
            }
        }
    }

    async fn hot_threads(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<ThreadSummary>, CoreError> {
        let mut pager = ListingPager::new(limit);

        while let Some((page_size, cursor)) = pager.next_request() {
            let listing = self
                .authorized(move |token| {
                    let cursor = cursor.clone();
                    async move {
                        self.api
                            .get_hot_posts(&token, subreddit, page_size, cursor.as_deref())
                            .await
                    }
                })
                .await?;
            pager.push_page(listing);
        }

        let threads = pager.into_threads();
        info!("Fetched {} hot threads from r/{}", threads.len(), subreddit);
        Ok(threads)
    }

    async fn comments(&self, thread_id: &str) -> Result<Vec<Comment>, CoreError> {
        self.authorized(move |token| async move { self.api.get_comments(&token, thread_id).await })
            .await
    }

    async fn reply(&self, thread_id: &str, text: &str) -> Result<String, CoreError> {
        let thing_id = if thread_id.starts_with("t3_") {
            thread_id.to_string()
        } else {
            format!("t3_{}", thread_id)
        };
        let thing_id = thing_id.as_str();

        self.authorized(move |token| async move {
            self.api.submit_comment(&token, thing_id, text).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn create_test_config() -> RedditOAuth2Config {
        RedditOAuth2Config::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "chorus_bot".to_string(),
            "hunter2".to_string(),
            "chorus/0.1 by u/chorus_bot".to_string(),
        )
    }

    fn token_expiring_in(secs_from_now: i64) -> RedditToken {
        let now = SystemTime::now();
        let expires_at = if secs_from_now >= 0 {
            now + Duration::from_secs(secs_from_now as u64)
        } else {
            now - Duration::from_secs(secs_from_now.unsigned_abs())
        };
        RedditToken {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at,
            scope: vec!["identity".to_string(), "read".to_string(), "submit".to_string()],
        }
    }

    #[test]
    fn test_client_creation() {
        let client = RedditClient::new(create_test_config()).unwrap();
        assert!(matches!(
            client.get_auth_state(),
            AuthState::NotAuthenticated
        ));
    }

    #[test]
    fn test_set_token_tracks_expiry() {
        let client = RedditClient::new(create_test_config()).unwrap();

        client.set_token(token_expiring_in(3600));
        assert!(matches!(
            client.get_auth_state(),
            AuthState::Authenticated { .. }
        ));

        client.set_token(token_expiring_in(-3600));
        assert!(matches!(
            client.get_auth_state(),
            AuthState::TokenExpired { .. }
        ));
    }

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        let client = RedditClient::new(create_test_config()).unwrap();
        client.set_token(token_expiring_in(3600));

        let access_token = client.ensure_authenticated().await.unwrap();
        assert_eq!(access_token, "token");
    }

    #[test]
    fn test_rejected_token_is_marked_expired() {
        let client = RedditClient::new(create_test_config()).unwrap();
        client.set_token(token_expiring_in(3600));

        client.expire_token();
        assert!(matches!(
            client.get_auth_state(),
            AuthState::TokenExpired { .. }
        ));
    }
}
