use async_trait::async_trait;
use futures::StreamExt;
use log::{ debug, error, warn };
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use super::ndjson::NdjsonDecoder;
use super::{ ChatClient, ChatCompletionRequest, FragmentStream };
use crate::llm::{ LlmConfig, LlmError, DEFAULT_BASE_URL };
use crate::models::chat::Fragment;

/// Consecutive malformed lines tolerated before a stream is abandoned.
pub const MAX_CONSECUTIVE_DECODE_ERRORS: usize = 3;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, LlmError> {
        let url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let http = HttpClient::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| LlmError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    async fn post(
        &self,
        request: &ChatCompletionRequest,
        deadline: Option<Duration>
    ) -> Result<reqwest::Response, LlmError> {
        debug!(
            "Request to model service: model={}, turns={}, stream={}",
            request.model,
            request.messages.len(),
            request.stream
        );
        let mut builder = self.http.post(self.chat_url()).json(request);
        if let Some(deadline) = deadline {
            builder = builder.timeout(deadline);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Model service returned {}: {}", status, body);
            return Err(LlmError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, request: &ChatCompletionRequest) -> Result<String, LlmError> {
        let response = self.post(request, Some(self.timeout)).await?;
        let body = response.text().await?;
        let data = serde_json
            ::from_str::<ChatResponse>(&body)
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        match data {
            ChatResponse { error: Some(message), .. } => {
                error!("Model service reported an error: {}", message);
                Err(LlmError::Upstream(message))
            }
            ChatResponse { message: Some(message), .. } => Ok(message.content),
            ChatResponse { message: None, .. } =>
                Err(LlmError::Decode("response has no message".to_string())),
        }
    }

    async fn chat_stream(
        &self,
        request: &ChatCompletionRequest
    ) -> Result<FragmentStream, LlmError> {
        let response = self.post(request, None).await?;
        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = FragmentDecoder::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Model service stream interrupted: {}", e);
                        yield Err(LlmError::from(e));
                        return;
                    }
                };
                for item in decoder.push(&chunk) {
                    let stop = !matches!(item, Ok(Fragment { done: false, .. }));
                    yield item;
                    if stop {
                        return;
                    }
                }
            }
            if let Some(item) = decoder.finish() {
                yield item;
            }
        };
        Ok(Box::pin(stream))
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}

/// Turns raw body bytes into fragments, skipping isolated malformed lines.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    lines: NdjsonDecoder,
    malformed: usize,
}

impl FragmentDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every line completed by `chunk`. Items after the first error or
    /// the first `done` fragment are meaningless and must not be forwarded.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Fragment, LlmError>> {
        let lines = match self.lines.push(chunk) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Abandoning model service stream: {}", e);
                return vec![Err(LlmError::StreamDecode(e.to_string()))];
            }
        };
        lines
            .iter()
            .filter_map(|line| self.decode(line))
            .collect()
    }

    pub fn finish(&mut self) -> Option<Result<Fragment, LlmError>> {
        let line = self.lines.finish()?;
        self.decode(&line)
    }

    fn decode(&mut self, line: &str) -> Option<Result<Fragment, LlmError>> {
        match serde_json::from_str::<StreamResponse>(line) {
            Ok(StreamResponse { error: Some(message), .. }) => {
                Some(Err(LlmError::Upstream(message)))
            }
            Ok(resp) => {
                self.malformed = 0;
                Some(
                    Ok(Fragment {
                        content: resp.message.map(|m| m.content).unwrap_or_default(),
                        done: resp.done,
                    })
                )
            }
            Err(e) => {
                self.malformed += 1;
                warn!("Could not decode stream fragment ({}): {}", e, line);
                if self.malformed > MAX_CONSECUTIVE_DECODE_ERRORS {
                    Some(Err(LlmError::StreamDecode(e.to_string())))
                } else {
                    None
                }
            }
        }
    }
}
