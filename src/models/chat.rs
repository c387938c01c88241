use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of the conversation. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Body of `POST /api/chat`. Optional fields fall back to the relay defaults.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            model: None,
            temperature: None,
            stream: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetReply {
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryReply {
    pub history: Vec<Turn>,
}

/// One incremental piece of a streamed reply, as decoded from the upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub content: String,
    pub done: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineMessage {
    pub role: Role,
    pub content: String,
}

/// One NDJSON line of the streamed `/api/chat` response body.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamLine {
    Message {
        message: LineMessage,
        done: bool,
    },
    Error {
        error: String,
        done: bool,
    },
}

impl StreamLine {
    pub fn content(content: impl Into<String>) -> Self {
        StreamLine::Message {
            message: LineMessage { role: Role::Assistant, content: content.into() },
            done: false,
        }
    }

    pub fn done() -> Self {
        StreamLine::Message {
            message: LineMessage { role: Role::Assistant, content: String::new() },
            done: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamLine::Error { error: message.into(), done: true }
    }

    /// Serializes the line with its trailing newline.
    pub fn to_ndjson(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"));
        line.push('\n');
        line
    }
}
