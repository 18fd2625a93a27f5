use crate::prompts::{reply_prompt, REPLY_SYSTEM};
use crate::provider::LlmProvider;
use crate::sentiment::{comment_sentiment, post_sentiment};
use chorus_core::{CoreError, Thread};
use tracing::debug;

/// Writes a reply for `thread` that mirrors the mood of the thread and of its
/// top comments. The model's text is returned untouched.
pub async fn generate_comment<P: LlmProvider>(
    provider: &P,
    thread: &Thread,
) -> Result<String, CoreError> {
    let post = post_sentiment(provider, &thread.title, &thread.body).await?;
    let comments = comment_sentiment(provider, &thread.title, &thread.comments).await?;
    debug!(
        thread_id = %thread.id,
        post_sentiment = %post,
        comment_sentiment = %comments,
        "Generating reply"
    );

    let prompt = reply_prompt(
        &thread.title,
        &thread.body,
        &thread.top_comments(),
        post,
        comments,
    );
    provider.complete(REPLY_SYSTEM, &prompt).await
}
