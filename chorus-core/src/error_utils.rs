use crate::error::*;
use tracing::{error, warn};

/// Classification and reporting for [`CoreError`].
pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    /// Stable SCREAMING_SNAKE identifier, e.g. `REDDIT_RATE_LIMIT`.
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "{}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "{}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => reddit_message(e),
            CoreError::Llm(e) => llm_message(e),
            CoreError::Log(LogError::AppendFailed { path, .. }) => format!(
                "The reply was posted but could not be recorded in {}; that thread may be answered again.",
                path
            ),
            CoreError::Log(LogError::ReadFailed { path, .. }) => {
                format!("Could not read {}. Check that the file is readable.", path)
            }
            CoreError::Config(e) => format!("Fix the configuration: {}.", e),
            CoreError::Network(_) => {
                "Could not reach the server. Check the network connection.".to_string()
            }
            other => other.to_string(),
        }
    }

    fn error_code(&self) -> String {
        let code = match self {
            CoreError::RedditApi(e) => return reddit_code(e),
            CoreError::Llm(e) => llm_code(e),
            CoreError::Log(LogError::ReadFailed { .. }) => "LOG_READ_FAILED",
            CoreError::Log(LogError::AppendFailed { .. }) => "LOG_APPEND_FAILED",
            CoreError::Log(LogError::InvalidId { .. }) => "LOG_INVALID_ID",
            CoreError::Config(ConfigError::Parse(_)) => "CONFIG_PARSE",
            CoreError::Config(ConfigError::MissingField { .. }) => "CONFIG_MISSING_FIELD",
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::Internal { .. } => "INTERNAL",
            CoreError::RateLimited { .. } => "RATE_LIMITED",
            CoreError::RequestFailed { .. } => "REQUEST_FAILED",
        };
        code.to_string()
    }
}

fn reddit_message(error: &RedditApiError) -> String {
    match error {
        RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken => {
            "Reddit did not accept the bot's credentials. Check client id, secret, username and password."
                .to_string()
        }
        RedditApiError::RateLimitExceeded { retry_after } => format!(
            "Reddit is throttling this account; wait {} seconds before running again.",
            retry_after
        ),
        RedditApiError::SubredditNotFound { subreddit } => {
            format!("r/{} does not exist or is private.", subreddit)
        }
        RedditApiError::ApiException {
            error_type,
            message,
        } => format!("Reddit refused the reply ({}): {}", error_type, message),
        other => format!("Reddit request failed: {}.", other),
    }
}

fn reddit_code(error: &RedditApiError) -> String {
    let code = match error {
        RedditApiError::ApiException { error_type, .. } => {
            return format!("REDDIT_{}", error_type);
        }
        RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED",
        RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT",
        RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN",
        RedditApiError::NotFound { .. } => "REDDIT_NOT_FOUND",
        RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND",
        RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND",
        RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN",
        RedditApiError::RequestTimeout => "REDDIT_TIMEOUT",
        RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE",
        RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR",
    };
    code.to_string()
}

fn llm_message(error: &LlmError) -> String {
    match error {
        LlmError::InvalidApiKey { provider } => {
            format!("The {} API key was rejected. Set OPENAI_API_KEY or llm.api_key.", provider)
        }
        other => format!("Could not get a completion: {}.", other),
    }
}

fn llm_code(error: &LlmError) -> &'static str {
    match error {
        LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY",
        LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT",
        LlmError::ServiceUnavailable { .. } => "LLM_UNAVAILABLE",
        LlmError::RequestTimeout { .. } => "LLM_TIMEOUT",
        LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE",
    }
}
