use std::time::Duration;
use thiserror::Error;

/// Every failure the bot can run into. Library crates return this and the
/// binary decides what to do with it.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Language model: {0}")]
    Llm(#[from] LlmError),

    #[error("Commented log: {0}")]
    Log(#[from] LogError),

    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP transport failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected internal state: {message}")]
    Internal { message: String },

    #[error("Throttled: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("{message}")]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RedditApiError {
    #[error("could not obtain an access token: {reason}")]
    AuthenticationFailed { reason: String },

    /// Raised both for HTTP 429 and for the `RATELIMIT` entry Reddit puts in
    /// the body of a rejected comment.
    #[error("rate limited, try again in {retry_after}s")]
    RateLimitExceeded { retry_after: u64 },

    #[error("access to {resource} is forbidden")]
    Forbidden { resource: String },

    #[error("{resource} does not exist")]
    NotFound { resource: String },

    #[error("r/{subreddit} does not exist or is private")]
    SubredditNotFound { subreddit: String },

    #[error("thread {post_id} has no comment listing")]
    PostNotFound { post_id: String },

    #[error("access token was rejected")]
    InvalidToken,

    #[error("request timed out")]
    RequestTimeout,

    #[error("unexpected response: {details}")]
    InvalidResponse { details: String },

    #[error("server answered with HTTP {status_code}")]
    ServerError { status_code: u16 },

    /// An error reported inside an otherwise successful API response body,
    /// e.g. `["THREAD_LOCKED", "that thread is locked", "parent"]`.
    #[error("request refused ({error_type}): {message}")]
    ApiException { error_type: String, message: String },
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{provider} rejected the API key")]
    InvalidApiKey { provider: String },

    #[error("{provider} rate limit hit, retry after {retry_after}s")]
    RateLimitExceeded { provider: String, retry_after: u64 },

    #[error("{provider} is unavailable")]
    ServiceUnavailable { provider: String },

    #[error("{provider} did not answer in time")]
    RequestTimeout { provider: String },

    #[error("{provider} returned a completion without choices")]
    InvalidResponseFormat { provider: String },
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("cannot read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot append to {path}: {source}")]
    AppendFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("thread id {id:?} must be non-empty and fit on one line")]
    InvalidId { id: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{path} does not exist")]
    FileNotFound { path: String },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("{field} cannot be {value}")]
    InvalidValue { field: String, value: String },

    #[error("no permission to read {path}")]
    PermissionDenied { path: String },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
