mod file;
mod memory;

pub use file::FileHistoryStore;
pub use memory::MemoryHistoryStore;

use async_trait::async_trait;
use log::info;
use std::path::PathBuf;
use thiserror::Error;
use crate::cli::Args;
use crate::models::chat::Turn;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write conversation to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize conversation: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("unsupported history store type: {0}")]
    UnsupportedType(String),
}

/// Ordered, append-only record of the active conversation.
///
/// Implementations keep the in-memory sequence identical to what was last
/// persisted: an append whose write fails is rolled back before the error
/// is returned.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&mut self, turn: Turn) -> Result<(), HistoryError>;

    fn history(&self) -> &[Turn];

    /// Clears memory and persisted state. Calling it on an empty store is a no-op
    /// that still succeeds.
    async fn reset(&mut self) -> Result<(), HistoryError>;
}

pub async fn create_history_store(
    args: &Args
) -> Result<Box<dyn HistoryStore>, HistoryError> {
    match args.history_type.to_lowercase().as_str() {
        "file" => {
            info!("Chat history will be stored in: {}", args.history_path);
            let store = FileHistoryStore::load(&args.history_path).await;
            Ok(Box::new(store))
        }
        "memory" => {
            info!("Chat history will be kept in memory only");
            Ok(Box::new(MemoryHistoryStore::new()))
        }
        other => Err(HistoryError::UnsupportedType(other.to_string())),
    }
}
