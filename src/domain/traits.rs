use crate::domain::error::ProviderError;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// A text-in/text-out language model endpoint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider label used in error messages, e.g. "OPENAI".
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}
