use crate::feed::FeedWalker;
use crate::poster::Poster;
use chorus_core::{AppConfig, CoreError};
use commented_log::CommentedLog;
use llm_interface::LlmProvider;
use reddit_client::{RedditPlatform, RetryPolicy};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BotOptions {
    pub subreddit: String,
    pub hot_limit: u32,
    /// Pause after each reply, drawn uniformly from this inclusive range.
    pub min_pause_secs: u64,
    pub max_pause_secs: u64,
    pub reply_policy: RetryPolicy,
}

impl BotOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            subreddit: config.reddit.subreddit.clone(),
            hot_limit: config.reddit.hot_limit,
            min_pause_secs: config.bot.min_pause_secs,
            max_pause_secs: config.bot.max_pause_secs,
            reply_policy: RetryPolicy::reply_rate_limit_with_delay(config.bot.rate_limit_delay()),
        }
    }

    fn pause(&self) -> Duration {
        let (low, high) = if self.min_pause_secs <= self.max_pause_secs {
            (self.min_pause_secs, self.max_pause_secs)
        } else {
            (self.max_pause_secs, self.min_pause_secs)
        };
        Duration::from_secs(fastrand::u64(low..=high))
    }
}

impl Default for BotOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub replied: usize,
}

/// One sequential pass over the hot listing.
pub struct Bot<P, L> {
    platform: P,
    feed: FeedWalker,
    poster: Poster<L>,
    log: CommentedLog,
    options: BotOptions,
}

impl<P: RedditPlatform, L: LlmProvider> Bot<P, L> {
    pub fn new(platform: P, llm: L, log: CommentedLog, options: BotOptions) -> Self {
        Self {
            feed: FeedWalker::new(options.subreddit.clone(), options.hot_limit),
            poster: Poster::new(llm, options.reply_policy.clone()),
            platform,
            log,
            options,
        }
    }

    pub fn log(&self) -> &CommentedLog {
        &self.log
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Logs in, then resolves and answers every new hot thread in order.
    /// The first error ends the run.
    pub async fn run(&mut self) -> Result<RunSummary, CoreError> {
        match self.platform.login().await? {
            Some(name) => info!("Running as u/{}", name),
            None => warn!("Continuing without a confirmed Reddit identity"),
        }

        let candidates = self.feed.candidates(&self.platform, &self.log).await?;
        let mut summary = RunSummary {
            candidates: candidates.len(),
            replied: 0,
        };

        for candidate in candidates {
            let thread = self.feed.resolve(&self.platform, candidate).await?;
            self.poster
                .post(&self.platform, &mut self.log, &thread)
                .await?;
            summary.replied += 1;

            sleep(self.options.pause()).await;
        }

        info!(
            "Run finished: replied to {} of {} new threads",
            summary.replied, summary.candidates
        );
        Ok(summary)
    }
}
