pub mod generator;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod sentiment;

pub use generator::generate_comment;
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use sentiment::{classify, comment_sentiment, parse_sentiment, post_sentiment};
