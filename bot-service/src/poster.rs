use chorus_core::{CoreError, Thread};
use commented_log::CommentedLog;
use llm_interface::{generate_comment, LlmProvider};
use reddit_client::{RedditPlatform, RetryExecutor, RetryPolicy};
use tracing::info;

/// Generates a reply for a thread, submits it and records the thread.
pub struct Poster<L> {
    llm: L,
    retry: RetryExecutor,
}

impl<L: LlmProvider> Poster<L> {
    pub fn new(llm: L, policy: RetryPolicy) -> Self {
        Self {
            llm,
            retry: RetryExecutor::new(policy),
        }
    }

    /// Returns the posted text. The thread is logged only once Reddit has
    /// accepted the reply.
    pub async fn post<P: RedditPlatform>(
        &self,
        platform: &P,
        log: &mut CommentedLog,
        thread: &Thread,
    ) -> Result<String, CoreError> {
        let text = generate_comment(&self.llm, thread).await?;

        let thread_id = thread.id.as_str();
        let body = text.as_str();
        let reply_id = self
            .retry
            .execute("reply", move || platform.reply(thread_id, body))
            .await?;

        log.append(thread_id).await?;
        info!(
            reply_id = %reply_id,
            "Replied to {:?} with {:?}",
            thread.title,
            text
        );
        Ok(text)
    }
}
