use crate::prompts::{comment_sentiment_prompt, post_sentiment_prompt, SENTIMENT_SYSTEM};
use crate::provider::LlmProvider;
use chorus_core::{top_comments, Comment, CoreError, Sentiment, TOP_COMMENT_COUNT};
use tracing::{debug, warn};

/// Maps a model reply to a sentiment.
///
/// A reply that is exactly `positive` or `negative` (ignoring case,
/// whitespace, quotes and trailing punctuation) is taken as is. Otherwise the
/// keyword that occurs first in the reply wins, and a reply naming neither is
/// `Neutral`.
pub fn parse_sentiment(reply: &str) -> Sentiment {
    strict_sentiment(reply).unwrap_or_else(|| lenient_sentiment(reply))
}

fn strict_sentiment(reply: &str) -> Option<Sentiment> {
    let token = reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();

    if token.eq_ignore_ascii_case("positive") {
        Some(Sentiment::Positive)
    } else if token.eq_ignore_ascii_case("negative") {
        Some(Sentiment::Negative)
    } else {
        None
    }
}

fn lenient_sentiment(reply: &str) -> Sentiment {
    let lower = reply.to_lowercase();
    match (lower.find("positive"), lower.find("negative")) {
        (Some(p), Some(n)) if n < p => Sentiment::Negative,
        (Some(_), _) => Sentiment::Positive,
        (None, Some(_)) => Sentiment::Negative,
        (None, None) => Sentiment::Neutral,
    }
}

/// Asks the model one sentiment question. Transport errors propagate;
/// unusable replies become `Neutral`.
pub async fn classify<P: LlmProvider>(
    provider: &P,
    system: &str,
    user: &str,
) -> Result<Sentiment, CoreError> {
    let reply = provider.complete(system, user).await?;

    if let Some(sentiment) = strict_sentiment(&reply) {
        debug!("Classified reply {:?} as {}", reply, sentiment);
        return Ok(sentiment);
    }

    let sentiment = lenient_sentiment(&reply);
    warn!(
        "Model did not answer with a single sentiment word: {:?}, read as {}",
        reply, sentiment
    );
    Ok(sentiment)
}

pub async fn post_sentiment<P: LlmProvider>(
    provider: &P,
    title: &str,
    body: &str,
) -> Result<Sentiment, CoreError> {
    classify(provider, SENTIMENT_SYSTEM, &post_sentiment_prompt(title, body)).await
}

/// Sentiment of the highest scored comments. With no comments there is
/// nothing to ask and the result is `Neutral`.
pub async fn comment_sentiment<P: LlmProvider>(
    provider: &P,
    title: &str,
    comments: &[Comment],
) -> Result<Sentiment, CoreError> {
    let top = top_comments(comments, TOP_COMMENT_COUNT);
    if top.is_empty() {
        debug!("No comments on {:?}, comment sentiment is neutral", title);
        return Ok(Sentiment::Neutral);
    }

    classify(provider, SENTIMENT_SYSTEM, &comment_sentiment_prompt(title, &top)).await
}
