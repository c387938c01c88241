//! Scripted [`ChatClient`] for exercising the relay without a model service.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Mutex;
use super::{ ChatClient, ChatCompletionRequest, FragmentStream };
use crate::llm::LlmError;
use crate::models::chat::Fragment;

pub struct ScriptedClient {
    reply: Result<String, LlmError>,
    fragments: Vec<Result<Fragment, LlmError>>,
    open_error: Option<LlmError>,
    hang_after_fragments: bool,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedClient {
    /// Replies `text` when buffered, and streams `parts` followed by a
    /// completion marker.
    pub fn new(text: &str, parts: &[&str]) -> Self {
        let mut fragments: Vec<Result<Fragment, LlmError>> = parts
            .iter()
            .map(|p| Ok(Fragment { content: p.to_string(), done: false }))
            .collect();
        fragments.push(Ok(Fragment { content: String::new(), done: true }));
        Self {
            reply: Ok(text.to_string()),
            fragments,
            open_error: None,
            hang_after_fragments: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(text, &[text])
    }

    pub fn streaming(parts: &[&str]) -> Self {
        Self::new(&parts.concat(), parts)
    }

    pub fn failing(err: LlmError) -> Self {
        Self {
            reply: Err(err.clone()),
            open_error: Some(err),
            ..Self::replying("")
        }
    }

    /// Streams exactly `fragments`, with no implicit completion marker.
    pub fn with_fragments(fragments: Vec<Result<Fragment, LlmError>>) -> Self {
        Self { fragments, ..Self::replying("") }
    }

    /// Never ends the stream after the scripted fragments.
    pub fn hanging(mut self) -> Self {
        self.hang_after_fragments = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record(&self, request: &ChatCompletionRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: &ChatCompletionRequest) -> Result<String, LlmError> {
        self.record(request);
        tokio::task::yield_now().await;
        self.reply.clone()
    }

    async fn chat_stream(
        &self,
        request: &ChatCompletionRequest
    ) -> Result<FragmentStream, LlmError> {
        self.record(request);
        tokio::task::yield_now().await;
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        // One scheduler turn per fragment, as a network stream would give.
        let fragments = futures::stream
            ::iter(self.fragments.clone())
            .then(|item| async move {
                tokio::task::yield_now().await;
                item
            });
        if self.hang_after_fragments {
            Ok(Box::pin(fragments.chain(futures::stream::pending())))
        } else {
            Ok(Box::pin(fragments))
        }
    }

    fn get_base_url(&self) -> String {
        "scripted://".to_string()
    }
}
