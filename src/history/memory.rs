use async_trait::async_trait;
use crate::history::{ HistoryError, HistoryStore };
use crate::models::chat::Turn;

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    turns: Vec<Turn>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&mut self, turn: Turn) -> Result<(), HistoryError> {
        self.turns.push(turn);
        Ok(())
    }

    fn history(&self) -> &[Turn] {
        &self.turns
    }

    async fn reset(&mut self) -> Result<(), HistoryError> {
        self.turns.clear();
        Ok(())
    }
}
