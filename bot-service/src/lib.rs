pub mod feed;
pub mod poster;
pub mod runner;

pub use feed::FeedWalker;
pub use poster::Poster;
pub use runner::{Bot, BotOptions, RunSummary};
