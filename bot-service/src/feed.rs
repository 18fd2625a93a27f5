use chorus_core::{CoreError, Thread, ThreadSummary};
use commented_log::CommentedLog;
use reddit_client::RedditPlatform;
use std::collections::HashSet;
use tracing::{debug, info};

/// Walks a subreddit's hot listing and turns entries into full threads.
#[derive(Debug, Clone)]
pub struct FeedWalker {
    subreddit: String,
    limit: u32,
}

impl FeedWalker {
    pub fn new(subreddit: impl Into<String>, limit: u32) -> Self {
        Self {
            subreddit: subreddit.into(),
            limit,
        }
    }

    /// Hot threads not yet in `log`, in listing order. A thread listed on
    /// two pages is kept once, and locked threads are skipped since Reddit
    /// refuses replies to them.
    pub async fn candidates<P: RedditPlatform>(
        &self,
        platform: &P,
        log: &CommentedLog,
    ) -> Result<Vec<ThreadSummary>, CoreError> {
        let listing = platform.hot_threads(&self.subreddit, self.limit).await?;
        let listed = listing.len();

        let mut seen = HashSet::new();
        let mut locked = 0;
        let mut fresh = Vec::with_capacity(listed);
        for summary in listing {
            if log.contains(&summary.id) || !seen.insert(summary.id.clone()) {
                continue;
            }
            if summary.locked {
                debug!("Skipping locked thread {}", summary.permalink);
                locked += 1;
                continue;
            }
            fresh.push(summary);
        }

        info!(
            "{} of {} hot threads in r/{} are new ({} locked)",
            fresh.len(),
            listed,
            self.subreddit,
            locked
        );
        Ok(fresh)
    }

    /// Fetches the comments of `summary` once and builds the thread.
    pub async fn resolve<P: RedditPlatform>(
        &self,
        platform: &P,
        summary: ThreadSummary,
    ) -> Result<Thread, CoreError> {
        let comments = platform.comments(&summary.id).await?;
        debug!(
            "Thread {} in r/{} has {} comments",
            summary.permalink,
            summary.subreddit,
            comments.len()
        );
        Ok(Thread::from_summary(summary, comments))
    }
}
