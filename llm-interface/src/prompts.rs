//! Prompt templates sent to the completion model.

use chorus_core::{Comment, Sentiment};

/// System message for both sentiment questions.
pub const SENTIMENT_SYSTEM: &str = "You are a charismatic, socially fluent regular of online communities. \
You write short, simple comments that blend into a discussion and get upvoted. \
Before replying to a thread you judge its mood, which is either positive or negative.";

/// System message for writing the reply itself.
pub const REPLY_SYSTEM: &str = "You are a charismatic, socially fluent regular of online communities. \
You write short, simple comments that blend into a discussion and get upvoted. \
You will see a thread and its most upvoted comments. Fit in with the crowd: \
copy their tone, share their opinion and answer the way they do.";

const ONE_WORD_ANSWER: &str =
    "Answer with exactly one word, POSITIVE or NEGATIVE, and nothing else.";

pub fn post_sentiment_prompt(title: &str, body: &str) -> String {
    format!(
        "Thread title: {title}\nThread text: {body}\n\nIs this thread positive or negative? {ONE_WORD_ANSWER}"
    )
}

/// Comments appear as raw text joined with ", ", in the order given.
pub fn comment_sentiment_prompt(title: &str, comments: &[Comment]) -> String {
    format!(
        "Top comments of the thread titled {title}: {}\n\nAre these comments, taken together, positive or negative towards the thread? {ONE_WORD_ANSWER}",
        join_bodies(comments)
    )
}

pub fn reply_prompt(
    title: &str,
    body: &str,
    comments: &[Comment],
    post_sentiment: Sentiment,
    comment_sentiment: Sentiment,
) -> String {
    format!(
        "Thread title: {title}\nThread text: {body}\nMost upvoted comments: {}\n\
The thread is {post_sentiment} and the comments are {comment_sentiment} towards it.\n\n\
Write one comment that fits in and earns upvotes. Match the tone of the other comments, \
keep it to a single short phrase in plain words, and reply with the comment only.",
        join_bodies(comments)
    )
}

fn join_bodies(comments: &[Comment]) -> String {
    comments
        .iter()
        .map(|c| c.body.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
