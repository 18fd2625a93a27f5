use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use chorus_core::{Comment, CoreError, RedditApiError, ThreadSummary};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit caps listing pages at 100 items.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Wait assumed when Reddit reports a rate limit without saying for how long.
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditUserData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub link_karma: i64,
    #[serde(default)]
    pub comment_karma: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    /// Either an empty string or a nested listing.
    #[serde(default)]
    pub replies: Value,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
        })
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        let waited = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, waited
        );

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(fields) = form {
            request_builder = request_builder.form(fields);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let remaining = header_value(&response, "x-ratelimit-remaining")
            .and_then(|v| v.parse::<f64>().ok());
        let reset = header_value(&response, "x-ratelimit-reset").and_then(|v| v.parse::<u64>().ok());
        self.rate_limiter.observe_server_budget(remaining, reset).await;

        let budget = self.rate_limiter.get_rate_limit_status().await;
        if budget.is_near_limit() {
            warn!(
                "Reddit request budget nearly spent: {:.0}% of the burst used, {:?} left on the server",
                budget.utilization_percentage(),
                budget.server_remaining
            );
        }

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let error = match status.as_u16() {
            429 => {
                let retry_after = header_value(&response, "retry-after")
                    .and_then(|v| v.parse::<u64>().ok())
                    .or(reset)
                    .unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => RedditApiError::NotFound {
                resource: endpoint.to_string(),
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => {
                let body = response.text().await.unwrap_or_default();
                return Err(CoreError::RequestFailed {
                    message: format!("{} {} returned {}: {}", method, endpoint, code, body),
                    status_code: Some(code),
                });
            }
        };

        Err(CoreError::RedditApi(error))
    }

    pub async fn get_user_info(&self, access_token: &str) -> Result<RedditUserData, CoreError> {
        let response = self
            .make_request(Method::GET, "/api/v1/me", access_token, None, None)
            .await?;

        let user_data: RedditUserData = response.json().await.map_err(|e| {
            error!("Failed to parse user data: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse user data".to_string(),
            })
        })?;

        debug!("Retrieved user info for: {}", user_data.name);
        Ok(user_data)
    }

    /// One page of `/r/{subreddit}/hot`.
    pub async fn get_hot_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/hot", subreddit);
        let limit_str = limit.min(MAX_PAGE_SIZE).to_string();
        let mut params = vec![("limit", limit_str.as_str()), ("raw_json", "1")];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()), None)
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::NotFound { .. }) => {
                    CoreError::RedditApi(RedditApiError::SubredditNotFound {
                        subreddit: subreddit.to_string(),
                    })
                }
                other => other,
            })?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse hot listing: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse hot posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} hot posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// The comment tree of a post as returned by a single request. "Load
    /// more" stubs are not expanded.
    pub async fn get_comments(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<Vec<Comment>, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let params = [("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()), None)
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::NotFound { .. }) => {
                    CoreError::RedditApi(RedditApiError::PostNotFound {
                        post_id: post_id.to_string(),
                    })
                }
                other => other,
            })?;

        let listings: Vec<RedditListing<Value>> = response.json().await.map_err(|e| {
            error!("Failed to parse comments for {}: {}", post_id, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comments for post {}", post_id),
            })
        })?;

        let comment_listing = listings.get(1).ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::PostNotFound {
                post_id: post_id.to_string(),
            })
        })?;

        let comments = flatten_comment_listing(comment_listing);
        debug!("Retrieved {} comments for post {}", comments.len(), post_id);
        Ok(comments)
    }

    /// Posts `text` as a reply to `thing_id` (a `t3_` or `t1_` fullname) and
    /// returns the fullname of the new comment.
    pub async fn submit_comment(
        &self,
        access_token: &str,
        thing_id: &str,
        text: &str,
    ) -> Result<String, CoreError> {
        let form = [("api_type", "json"), ("thing_id", thing_id), ("text", text)];

        let response = self
            .make_request(Method::POST, "/api/comment", access_token, None, Some(&form[..]))
            .await?;

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse comment submission response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse comment submission response".to_string(),
            })
        })?;

        let name = interpret_comment_response(&body)?;
        info!("Submitted comment {} on {}", name, thing_id);
        Ok(name)
    }
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}

/// Every `t1` comment in a listing, level by level: all top-level comments
/// first, then their replies in the same order. `more` placeholders are
/// dropped.
pub fn flatten_comment_listing(listing: &RedditListing<Value>) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut queue: VecDeque<RedditListingChild<Value>> =
        listing.data.children.iter().cloned().collect();

    while let Some(child) = queue.pop_front() {
        if child.kind != "t1" {
            continue;
        }

        let data: RedditCommentData = match serde_json::from_value(child.data) {
            Ok(data) => data,
            Err(e) => {
                warn!("Skipping malformed comment: {}", e);
                continue;
            }
        };

        comments.push(Comment::new(data.body, data.score));

        if data.replies.is_object() {
            match serde_json::from_value::<RedditListing<Value>>(data.replies) {
                Ok(replies) => queue.extend(replies.data.children),
                Err(e) => warn!("Skipping malformed replies of {}: {}", data.id, e),
            }
        }
    }

    comments
}

/// Accumulates pages of a hot listing until `limit` entries are collected
/// or Reddit runs out of pages.
#[derive(Debug)]
pub struct ListingPager {
    limit: u32,
    threads: Vec<ThreadSummary>,
    after: Option<String>,
    exhausted: bool,
}

impl ListingPager {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            threads: Vec::new(),
            after: None,
            exhausted: false,
        }
    }

    fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.threads.len() as u32)
    }

    /// Page size and `after` cursor for the next request, or `None` when
    /// the listing is complete.
    pub fn next_request(&self) -> Option<(u32, Option<String>)> {
        let remaining = self.remaining();
        if self.exhausted || remaining == 0 {
            return None;
        }
        Some((remaining.min(MAX_PAGE_SIZE), self.after.clone()))
    }

    /// Adds a page, truncated to what is still missing. An empty page or a
    /// page without an `after` cursor ends the listing.
    pub fn push_page(&mut self, page: RedditListing<RedditPostData>) {
        let remaining = self.remaining() as usize;
        let page_len = page.data.children.len();
        self.threads.extend(
            page.data
                .children
                .into_iter()
                .take(remaining)
                .map(|child| ThreadSummary::from(child.data)),
        );

        self.after = page.data.after;
        if page_len == 0 || self.after.is_none() {
            self.exhausted = true;
        }
    }

    pub fn into_threads(self) -> Vec<ThreadSummary> {
        self.threads
    }
}

/// Reads the `{"json": {"errors": [...], "data": {...}}}` envelope of
/// `/api/comment`.
pub fn interpret_comment_response(body: &Value) -> Result<String, RedditApiError> {
    let json = body.get("json").unwrap_or(body);

    if let Some(first) = json
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let error_type = first
            .get(0)
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();
        let message = first
            .get(1)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if error_type == "RATELIMIT" {
            let retry_after =
                parse_rate_limit_wait(&message).unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS);
            return Err(RedditApiError::RateLimitExceeded { retry_after });
        }
        return Err(RedditApiError::ApiException {
            error_type,
            message,
        });
    }

    json.pointer("/data/things/0/data")
        .and_then(|thing| thing.get("name").or_else(|| thing.get("id")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RedditApiError::InvalidResponse {
            details: "Comment submission response did not include the new comment".to_string(),
        })
}

/// Seconds to wait according to a RATELIMIT message such as
/// "you are doing that too much. try again in 6 minutes."
pub fn parse_rate_limit_wait(message: &str) -> Option<u64> {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    words.windows(2).find_map(|pair| {
        let amount: u64 = pair[0].parse().ok()?;
        let unit = pair[1];
        if unit.starts_with("millisecond") {
            Some(amount.div_ceil(1000))
        } else if unit.starts_with("second") {
            Some(amount)
        } else if unit.starts_with("minute") {
            amount.checked_mul(60)
        } else {
            None
        }
    })
}

impl From<RedditPostData> for ThreadSummary {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            body: post_data.selftext,
            subreddit: post_data.subreddit,
            permalink: post_data.permalink,
            locked: post_data.locked,
        }
    }
}
