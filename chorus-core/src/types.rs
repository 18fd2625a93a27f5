use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

/// Number of top-scored comments that feed the sentiment and reply prompts.
pub const TOP_COMMENT_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
    pub score: i64,
}

impl Comment {
    pub fn new(body: impl Into<String>, score: i64) -> Self {
        Self {
            body: body.into(),
            score,
        }
    }
}

/// A hot-listing entry whose comment tree has not been fetched yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub body: String,
    pub subreddit: String,
    pub permalink: String,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    /// Self-text of the thread; empty for link posts.
    pub body: String,
    pub comments: Vec<Comment>,
}

impl Thread {
    pub fn from_summary(summary: ThreadSummary, comments: Vec<Comment>) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            body: summary.body,
            comments,
        }
    }

    pub fn top_comments(&self) -> Vec<Comment> {
        top_comments(&self.comments, TOP_COMMENT_COUNT)
    }
}

/// Highest-scored comments first, at most `limit` of them. Ties keep their
/// original order.
pub fn top_comments(comments: &[Comment], limit: usize) -> Vec<Comment> {
    let mut ranked = comments.to_vec();
    ranked.sort_by_key(|comment| Reverse(comment.score));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(raw: &[(&str, i64)]) -> Vec<Comment> {
        raw.iter()
            .map(|(body, score)| Comment::new(*body, *score))
            .collect()
    }

    #[test]
    fn test_top_comments_sorted_and_truncated() {
        let all = comments(&[("a", 5), ("b", 1), ("c", 9), ("d", 2), ("e", 7)]);
        let top = top_comments(&all, TOP_COMMENT_COUNT);
        assert_eq!(top, comments(&[("c", 9), ("e", 7), ("a", 5), ("d", 2)]));
    }

    #[test]
    fn test_top_comments_stable_on_ties() {
        let all = comments(&[("first", 3), ("second", 3), ("low", -2), ("third", 3)]);
        let top = top_comments(&all, 3);
        assert_eq!(top, comments(&[("first", 3), ("second", 3), ("third", 3)]));
    }

    #[test]
    fn test_top_comments_with_fewer_than_limit() {
        let all = comments(&[("only", -1), ("two", 4)]);
        let top = top_comments(&all, TOP_COMMENT_COUNT);
        assert_eq!(top, comments(&[("two", 4), ("only", -1)]));
        assert!(top_comments(&[], TOP_COMMENT_COUNT).is_empty());
    }

    #[test]
    fn test_thread_from_summary() {
        let summary = ThreadSummary {
            id: "abc123".to_string(),
            title: "Title".to_string(),
            body: String::new(),
            subreddit: "rust".to_string(),
            permalink: "/r/rust/comments/abc123/title/".to_string(),
            locked: false,
        };
        let thread = Thread::from_summary(summary, comments(&[("hi", 1)]));
        assert_eq!(thread.id, "abc123");
        assert!(thread.body.is_empty());
        assert_eq!(thread.top_comments().len(), 1);
    }

    #[test]
    fn test_sentiment_display() {
        assert_eq!(Sentiment::Positive.to_string(), "positive");
        assert_eq!(Sentiment::Negative.to_string(), "negative");
        assert_eq!(Sentiment::Neutral.to_string(), "neutral");
        assert_eq!(
            serde_json::to_string(&Sentiment::Neutral).unwrap(),
            "\"neutral\""
        );
    }
}
