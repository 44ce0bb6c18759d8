use async_trait::async_trait;

#[derive(Debug)]
pub enum CompletionProviderError {
    NetworkError(String),
    ApiError(String),
    EmptyCompletion,
}

impl std::fmt::Display for CompletionProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            CompletionProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            CompletionProviderError::EmptyCompletion => write!(f, "Model returned no completion"),
        }
    }
}

impl std::error::Error for CompletionProviderError {}

/// Chat-completion boundary used by the SQL translator. Failures here are
/// hard failures; retry policy belongs to the caller, not this crate.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<String, CompletionProviderError>;
}
