pub mod api;
pub mod auth;
pub mod client;
pub mod platform;
pub mod rate_limiter;
pub mod retry;
pub mod user_agent;

pub use api::*;
pub use auth::*;
pub use client::*;
pub use platform::*;
pub use rate_limiter::*;
pub use retry::*;
pub use user_agent::*;

mod tests;
