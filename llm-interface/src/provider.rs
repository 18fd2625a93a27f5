use chorus_core::CoreError;

/// A chat completion backend. One handle is built by the caller and lent to
/// every classifier and generator call.
pub trait LlmProvider {
    /// Sends one system + user message pair and returns the text of the first
    /// choice.
    async fn complete(&self, system: &str, user: &str) -> Result<String, CoreError>;
}

