pub mod ndjson;
pub mod ollama;
#[cfg(test)]
pub mod test_utils;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use super::{ LlmConfig, LlmError };
use self::ollama::OllamaClient;
use crate::models::chat::{ Fragment, Turn };

/// Fragments of one streamed reply, in arrival order. Dropping the stream
/// releases the upstream connection.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, LlmError>> + Send>>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub temperature: f64,
}

/// Upstream `/api/chat` request body.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the request and waits for the complete reply text.
    async fn chat(&self, request: &ChatCompletionRequest) -> Result<String, LlmError>;

    /// Opens a streamed reply. Connection and status failures are returned
    /// here; failures after the first byte arrive through the stream.
    async fn chat_stream(
        &self,
        request: &ChatCompletionRequest
    ) -> Result<FragmentStream, LlmError>;

    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OllamaClient::from_config(config)?;
    Ok(Arc::new(client))
}
