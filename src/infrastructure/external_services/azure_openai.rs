use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::application::ports::completion_provider::{
    CompletionProvider, CompletionProviderError,
};
use crate::application::ports::embedding_provider::{EmbeddingProvider, EmbeddingProviderError};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embedding_deployment: String,
    pub embedding_dimension: usize,
    pub timeout_secs: u64,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        let endpoint = env::var("AZURE_OPENAI_ENDPOINT")
            .unwrap_or_else(|_| "https://example.openai.azure.com".to_string());
        let api_key = env::var("AZURE_OPENAI_API_KEY").unwrap_or_default();
        let chat_deployment =
            env::var("MODEL_DEPLOYMENT_NAME").unwrap_or_else(|_| "gpt-4o".to_string());
        let embedding_deployment = env::var("EMBEDDING_MODEL_NAME")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());

        Self {
            endpoint,
            api_key,
            api_version: "2024-02-15-preview".to_string(),
            chat_deployment,
            embedding_deployment,
            embedding_dimension: 1536,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug)]
pub enum AzureOpenAiError {
    RequestError(String),
    ApiError(String),
    ParseError(String),
}

impl std::fmt::Display for AzureOpenAiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AzureOpenAiError::RequestError(msg) => write!(f, "Request error: {}", msg),
            AzureOpenAiError::ApiError(msg) => write!(f, "API error: {}", msg),
            AzureOpenAiError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AzureOpenAiError {}

/// Azure-OpenAI-shaped REST client covering both external calls the system
/// makes: chat completions for SQL generation and embeddings for similarity
/// search. Calls are bounded by the client timeout and never retried here.
pub struct AzureOpenAiClient {
    client: Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(AzureOpenAiConfig::default())
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint, self.config.chat_deployment, self.config.api_version
        )
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.config.endpoint, self.config.embedding_deployment, self.config.api_version
        )
    }

    pub async fn chat_completion(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<String, AzureOpenAiError> {
        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            max_tokens,
        };

        let response = self
            .client
            .post(self.chat_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AzureOpenAiError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AzureOpenAiError::ApiError(format!("{}: {}", status, body)));
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| AzureOpenAiError::ParseError(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AzureOpenAiError::ParseError("response held no completion".to_string()))
    }

    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vector>, AzureOpenAiError> {
        let request = EmbeddingsRequest { input: inputs };

        let response = self
            .client
            .post(self.embeddings_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AzureOpenAiError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AzureOpenAiError::ApiError(format!("{}: {}", status, body)));
        }

        let parsed = response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| AzureOpenAiError::ParseError(e.to_string()))?;

        if parsed.data.len() != inputs.len() {
            return Err(AzureOpenAiError::ParseError(format!(
                "requested {} embeddings, received {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        let mut data = parsed.data;
        data.sort_by_key(|datum| datum.index);

        Ok(data
            .into_iter()
            .map(|datum| Vector::from(datum.embedding))
            .collect())
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<String, CompletionProviderError> {
        let completion = self
            .chat_completion(system_prompt, user_text, max_tokens)
            .await
            .map_err(|e| match e {
                AzureOpenAiError::RequestError(msg) => CompletionProviderError::NetworkError(msg),
                AzureOpenAiError::ApiError(msg) | AzureOpenAiError::ParseError(msg) => {
                    CompletionProviderError::ApiError(msg)
                }
            })?;

        if completion.is_empty() {
            return Err(CompletionProviderError::EmptyCompletion);
        }

        Ok(completion)
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vector, EmbeddingProviderError> {
        let input = [text.to_string()];
        let mut embeddings = self.embed(&input).await.map_err(map_embedding_error)?;

        embeddings
            .pop()
            .ok_or_else(|| EmbeddingProviderError::ApiError("no embedding returned".to_string()))
    }

    async fn generate_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vector>, EmbeddingProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.embed(texts).await.map_err(map_embedding_error)
    }

    fn embedding_dimension(&self) -> usize {
        self.config.embedding_dimension
    }
}

fn map_embedding_error(e: AzureOpenAiError) -> EmbeddingProviderError {
    match e {
        AzureOpenAiError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
        AzureOpenAiError::ApiError(msg) | AzureOpenAiError::ParseError(msg) => {
            EmbeddingProviderError::ApiError(msg)
        }
    }
}
