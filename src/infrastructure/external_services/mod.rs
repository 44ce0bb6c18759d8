pub mod azure_openai;

pub use azure_openai::{AzureOpenAiClient, AzureOpenAiConfig};
