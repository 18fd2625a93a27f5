use chorus_core::{CoreError, RedditApiError};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, ResourceOwnerPassword,
    ResourceOwnerUsername, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before Reddit would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Credentials of a Reddit "script" app acting as a single user.
#[derive(Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        user_agent: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            username,
            password,
            user_agent,
        }
    }
}

impl std::fmt::Debug for RedditOAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditOAuth2Config")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { token: RedditToken },
    TokenExpired { token: RedditToken },
}

pub fn required_scopes() -> Vec<&'static str> {
    vec!["identity", "read", "submit"]
}

pub(crate) fn build_oauth_client(config: &RedditOAuth2Config) -> Result<BasicClient, CoreError> {
    let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
        message: format!("Invalid authorization URL: {}", e),
    })?;
    let token_url = TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| CoreError::Internal {
        message: format!("Invalid token URL: {}", e),
    })?;

    Ok(BasicClient::new(
        ClientId::new(config.client_id.clone()),
        Some(ClientSecret::new(config.client_secret.clone())),
        auth_url,
        Some(token_url),
    )
    .set_auth_type(AuthType::BasicAuth))
}

/// Runs the resource-owner password grant and returns a fresh token.
pub(crate) async fn request_password_token(
    oauth_client: &BasicClient,
    http: &reqwest::Client,
    config: &RedditOAuth2Config,
) -> Result<RedditToken, CoreError> {
    debug!("Requesting Reddit access token for u/{}", config.username);

    let username = ResourceOwnerUsername::new(config.username.clone());
    let password = ResourceOwnerPassword::new(config.password.clone());
    let mut request = oauth_client.exchange_password(&username, &password);
    for scope in required_scopes() {
        request = request.add_scope(Scope::new(scope.to_string()));
    }

    let response = request
        .request_async(|req| token_http_client(http.clone(), req))
        .await
        .map_err(|e| {
            error!("Reddit token exchange failed: {}", e);
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: e.to_string(),
            })
        })?;

    let lifetime = response
        .expires_in()
        .unwrap_or_else(|| Duration::from_secs(3600));
    let token = RedditToken {
        access_token: response.access_token().secret().clone(),
        refresh_token: response.refresh_token().map(|t| t.secret().clone()),
        expires_at: SystemTime::now() + lifetime,
        scope: response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default(),
    };

    info!("Obtained Reddit access token valid for {:?}", lifetime);
    Ok(token)
}

/// Sends token requests with the app's own client so Reddit sees the
/// configured user agent.
async fn token_http_client(
    http: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_config_debug_hides_secrets() {
        let rendered = format!("{:?}", create_test_config());
        assert!(rendered.contains("test_client_id"));
        assert!(!rendered.contains("test_client_secret"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_oauth_client_builds() {
        assert!(build_oauth_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_required_scopes() {
        assert_eq!(required_scopes(), vec!["identity", "read", "submit"]);
    }

    #[test]
    fn test_token_expiry() {
        let fresh = RedditToken {
            access_token: "valid".to_string(),
            refresh_token: None,
            expires_at: SystemTime::now() + Duration::from_secs(3600),
            scope: vec!["identity".to_string()],
        };
        assert!(!fresh.is_expired());

        let almost_expired = RedditToken {
            expires_at: SystemTime::now() + Duration::from_secs(30),
            ..fresh.clone()
        };
        assert!(almost_expired.is_expired());
    }

    #[test]
    fn test_token_serialization() {
        let token = RedditToken {
            access_token: "test_access_token".to_string(),
            refresh_token: Some("test_refresh_token".to_string()),
            expires_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1640995200),
            scope: vec!["identity".to_string(), "submit".to_string()],
        };

        let serialized = serde_json::to_string(&token).unwrap();
        assert!(serialized.contains("test_access_token"));

        let deserialized: RedditToken = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.access_token, token.access_token);
        assert_eq!(deserialized.refresh_token, token.refresh_token);
        assert_eq!(deserialized.expires_at, token.expires_at);
        assert_eq!(deserialized.scope, token.scope);
    }
}
