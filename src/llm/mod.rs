pub mod chat;

use std::time::Duration;
use thiserror::Error;
use crate::cli::Args;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("failed to reach model service: {0}")]
    Unavailable(String),
    #[error("Error {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("model service error: {0}")]
    Upstream(String),
    #[error("malformed response from model service: {0}")]
    Decode(String),
    #[error("too many malformed stream fragments: {0}")]
    StreamDecode(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Unavailable(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            base_url: args.chat_base_url.clone().filter(|u| !u.trim().is_empty()),
            timeout: Duration::from_secs(args.upstream_timeout_secs),
        }
    }
}
