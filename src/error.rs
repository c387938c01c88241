use thiserror::Error;
use crate::history::HistoryError;
use crate::llm::LlmError;

/// Failure of a single chat exchange. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error("{0}")]
    UpstreamError(String),
    #[error("{0}")]
    StreamDecode(String),
    #[error("storage error: {0}")]
    Storage(#[from] HistoryError),
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        let message = err.to_string();
        match err {
            LlmError::Unavailable(_) => RelayError::UpstreamUnavailable(message),
            LlmError::Status { .. } | LlmError::Upstream(_) | LlmError::Decode(_) => {
                RelayError::UpstreamError(message)
            }
            LlmError::StreamDecode(_) => RelayError::StreamDecode(message),
        }
    }
}
