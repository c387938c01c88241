use async_trait::async_trait;
use log::{ debug, info, warn };
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use tokio::fs;
use crate::history::{ HistoryError, HistoryStore };
use crate::models::chat::{ Role, Turn };

/// Conversation persisted as a pretty-printed JSON array of `{role, content}`
/// records. The file is rewritten in full on every append.
#[derive(Debug)]
pub struct FileHistoryStore {
    path: PathBuf,
    turns: Vec<Turn>,
}

impl FileHistoryStore {
    /// Loads the conversation from `path`. A missing, empty or corrupted file
    /// starts a fresh conversation instead of failing.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let turns = match fs::read_to_string(&path).await {
            Ok(content) => parse_turns(&path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No conversation file at {}, starting fresh", path.display());
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Could not read conversation file {}: {}. Starting with a fresh history.",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };
        info!("Loaded {} turns from {}", turns.len(), path.display());
        Self { path, turns }
    }

    async fn persist(&self) -> Result<(), HistoryError> {
        let json = serde_json::to_vec_pretty(&self.turns)?;
        fs::write(&self.path, json).await.map_err(|source| HistoryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn parse_turns(path: &Path, content: &str) -> Vec<Turn> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<Turn>>(content) {
        Ok(mut turns) => {
            // The system prompt is configured, never stored. Older chat logs
            // still carry it as a record.
            let loaded = turns.len();
            turns.retain(|t| t.role != Role::System);
            let dropped = loaded - turns.len();
            if dropped > 0 {
                debug!("Dropping {} system records from {}", dropped, path.display());
            }
            turns
        }
        Err(e) => {
            warn!(
                "Conversation file {} is corrupted ({}). Starting with a fresh history.",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn append(&mut self, turn: Turn) -> Result<(), HistoryError> {
        self.turns.push(turn);
        if let Err(e) = self.persist().await {
            self.turns.pop();
            return Err(e);
        }
        Ok(())
    }

    fn history(&self) -> &[Turn] {
        &self.turns
    }

    async fn reset(&mut self) -> Result<(), HistoryError> {
        self.turns.clear();
        fs::write(&self.path, b"").await.map_err(|source| HistoryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::load(dir.path().join("chatlog.json")).await;
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn test_append_then_reload_reproduces_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlog.json");

        let mut store = FileHistoryStore::load(&path).await;
        store.append(Turn::user("Hi")).await.unwrap();
        store.append(Turn::assistant("Hello there!")).await.unwrap();
        store.append(Turn::user("How are you?")).await.unwrap();

        let reloaded = FileHistoryStore::load(&path).await;
        assert_eq!(reloaded.history(), store.history());
        assert_eq!(reloaded.history().len(), 3);
        assert_eq!(reloaded.history()[1], Turn::assistant("Hello there!"));
    }

    #[tokio::test]
    async fn test_file_is_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlog.json");

        let mut store = FileHistoryStore::load(&path).await;
        store.append(Turn::user("Hi")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n  {"));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[0]["content"], "Hi");
    }

    #[tokio::test]
    async fn test_corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlog.json");
        std::fs::write(&path, "[{\"role\": \"user\", \"content\":").unwrap();

        let store = FileHistoryStore::load(&path).await;
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn test_leading_system_records_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlog.json");
        std::fs::write(
            &path,
            r#"[
  {"role": "system", "content": "You are a friendly and helpful AI assistant."},
  {"role": "user", "content": "Hi"},
  {"role": "assistant", "content": "Hello"}
]"#
        ).unwrap();

        let store = FileHistoryStore::load(&path).await;
        assert_eq!(store.history(), &[Turn::user("Hi"), Turn::assistant("Hello")]);
    }

    #[tokio::test]
    async fn test_system_records_anywhere_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlog.json");
        std::fs::write(
            &path,
            r#"[
  {"role": "user", "content": "Hi"},
  {"role": "system", "content": "Answer in French."},
  {"role": "assistant", "content": "Bonjour"},
  {"role": "system", "content": "Be brief."}
]"#
        ).unwrap();

        let mut store = FileHistoryStore::load(&path).await;
        assert_eq!(store.history(), &[Turn::user("Hi"), Turn::assistant("Bonjour")]);

        store.append(Turn::user("Again")).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"system\""));
    }

    #[tokio::test]
    async fn test_reset_truncates_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlog.json");

        let mut store = FileHistoryStore::load(&path).await;
        store.append(Turn::user("Hi")).await.unwrap();

        store.reset().await.unwrap();
        assert!(store.history().is_empty());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        store.reset().await.unwrap();
        assert!(store.history().is_empty());

        let reloaded = FileHistoryStore::load(&path).await;
        assert!(reloaded.history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_append() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be written as a file.
        let mut store = FileHistoryStore::load(dir.path()).await;
        assert!(store.history().is_empty());

        let err = store.append(Turn::user("Hi")).await.unwrap_err();
        assert!(matches!(err, HistoryError::Write { .. }));
        assert!(store.history().is_empty());
    }
}
