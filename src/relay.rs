use futures::{ Stream, StreamExt };
use log::{ debug, error, info, warn };
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cli::Args;
use crate::error::RelayError;
use crate::history::HistoryStore;
use crate::llm::chat::{ ChatClient, ChatCompletionRequest, ChatOptions };
use crate::models::chat::{ ChatRequest, StreamLine, Turn };

pub const DEFAULT_MODEL: &str = "tinyllama";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful AI assistant.";

pub type SharedStore = Arc<Mutex<Box<dyn HistoryStore>>>;

/// Relay output for one streamed exchange, in the order it is sent to the caller.
pub type RelayStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

#[derive(Debug)]
pub enum StreamEvent {
    Content(String),
    /// The reply is complete and has been committed to the conversation.
    Done,
    /// The exchange ended early; nothing further follows.
    Failed(RelayError),
}

impl StreamEvent {
    pub fn to_line(&self) -> StreamLine {
        match self {
            StreamEvent::Content(content) => StreamLine::content(content.as_str()),
            StreamEvent::Done => StreamLine::done(),
            StreamEvent::Failed(e) => StreamLine::error(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub default_model: String,
    pub default_temperature: f64,
    pub system_prompt: Option<String>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl RelaySettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            default_model: args.chat_model.clone(),
            default_temperature: args.temperature,
            system_prompt: Some(args.system_prompt.clone()).filter(|p| !p.trim().is_empty()),
        }
    }
}

struct Exchange {
    id: Uuid,
    model: String,
    temperature: f64,
}

/// Mediates chat exchanges between the caller and the model service.
///
/// Each exchange holds the conversation lock from the moment the user turn is
/// appended until the assistant turn is committed, so concurrent requests are
/// served one after another and their turns never interleave.
#[derive(Clone)]
pub struct RelayService {
    store: SharedStore,
    client: Arc<dyn ChatClient>,
    settings: RelaySettings,
}

impl RelayService {
    pub fn new(
        store: Box<dyn HistoryStore>,
        client: Arc<dyn ChatClient>,
        settings: RelaySettings
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            client,
            settings,
        }
    }

    /// Buffered exchange: returns the complete reply text.
    pub async fn chat(&self, request: ChatRequest) -> Result<String, RelayError> {
        let exchange = self.prepare(&request)?;
        let mut store = self.store.lock().await;
        store.append(Turn::user(request.message.as_str())).await?;
        info!("[{}] User: {}", exchange.id, request.message);

        let upstream = self.build_request(store.history(), &exchange, false);
        let reply = match self.client.chat(&upstream).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("[{}] Model service call failed: {}", exchange.id, e);
                return Err(e.into());
            }
        };
        info!("[{}] Assistant: {}", exchange.id, reply);

        store.append(Turn::assistant(reply.as_str())).await?;
        Ok(reply)
    }

    /// Streaming exchange. Failures before the first fragment are returned as
    /// errors; later ones end the stream with [`StreamEvent::Failed`].
    ///
    /// The reply is committed only when the stream finishes cleanly. A stream
    /// that fails midway, or is dropped by the caller, leaves no assistant turn.
    pub async fn chat_stream(&self, request: ChatRequest) -> Result<RelayStream, RelayError> {
        let exchange = self.prepare(&request)?;
        let mut store = self.store.clone().lock_owned().await;
        store.append(Turn::user(request.message.as_str())).await?;
        info!("[{}] User (streaming): {}", exchange.id, request.message);

        let upstream = self.build_request(store.history(), &exchange, true);
        let mut fragments = match self.client.chat_stream(&upstream).await {
            Ok(fragments) => fragments,
            Err(e) => {
                error!("[{}] Could not open model service stream: {}", exchange.id, e);
                return Err(e.into());
            }
        };

        let id = exchange.id;
        let stream = async_stream::stream! {
            let mut reply = String::new();
            let mut completed = false;
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        if !fragment.content.is_empty() {
                            reply.push_str(&fragment.content);
                            yield StreamEvent::Content(fragment.content);
                        }
                        if fragment.done {
                            completed = true;
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("[{}] Stream failed after {} bytes, discarding partial reply: {}", id, reply.len(), e);
                        yield StreamEvent::Failed(e.into());
                        return;
                    }
                }
            }
            drop(fragments);

            if !completed {
                warn!("[{}] Model service closed the stream without a completion marker", id);
            }
            if reply.is_empty() {
                debug!("[{}] Empty reply, nothing to store", id);
            } else {
                info!("[{}] Assistant (streamed): {}", id, reply);
                if let Err(e) = store.append(Turn::assistant(reply)).await {
                    error!("[{}] Could not store streamed reply: {}", id, e);
                    yield StreamEvent::Failed(e.into());
                    return;
                }
            }
            yield StreamEvent::Done;
        };
        Ok(Box::pin(stream))
    }

    pub async fn reset(&self) -> Result<(), RelayError> {
        self.store.lock().await.reset().await?;
        info!("Chat history reset");
        Ok(())
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.store.lock().await.history().to_vec()
    }

    fn prepare(&self, request: &ChatRequest) -> Result<Exchange, RelayError> {
        if request.message.trim().is_empty() {
            return Err(RelayError::InvalidRequest("message must not be empty".to_string()));
        }
        let temperature = request.temperature.unwrap_or(self.settings.default_temperature);
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(
                RelayError::InvalidRequest(
                    format!("temperature must be a non-negative number, got {}", temperature)
                )
            );
        }
        let model = request.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.default_model.as_str())
            .to_string();

        Ok(Exchange { id: Uuid::new_v4(), model, temperature })
    }

    fn build_request(
        &self,
        history: &[Turn],
        exchange: &Exchange,
        stream: bool
    ) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.settings.system_prompt {
            messages.push(Turn::system(prompt.as_str()));
        }
        messages.extend_from_slice(history);

        ChatCompletionRequest {
            model: exchange.model.clone(),
            messages,
            stream,
            options: ChatOptions { temperature: exchange.temperature },
        }
    }
}
