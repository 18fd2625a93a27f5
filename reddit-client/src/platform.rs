use chorus_core::{Comment, CoreError, ThreadSummary};

/// The slice of Reddit the bot needs. Implemented by
/// [`RedditClient`](crate::RedditClient) and by in-memory doubles in tests.
pub trait RedditPlatform {
    /// Obtains credentials and returns the account name when Reddit
    /// confirms it. Failing to obtain a token is an error; failing only the
    /// identity check yields `Ok(None)`.
    async fn login(&self) -> Result<Option<String>, CoreError>;

    /// Up to `limit` entries of the subreddit's hot listing, in listing order.
    async fn hot_threads(&self, subreddit: &str, limit: u32)
        -> Result<Vec<ThreadSummary>, CoreError>;

    /// Every comment of the thread present in one fetch of its comment tree.
    async fn comments(&self, thread_id: &str) -> Result<Vec<Comment>, CoreError>;

    /// Replies to the thread and returns the new comment's fullname.
    async fn reply(&self, thread_id: &str, text: &str) -> Result<String, CoreError>;
}
