use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8000")]
    pub server_addr: String,

    /// Directory holding the browser frontend, served under /frontend.
    #[arg(long, env = "FRONTEND_DIR", default_value = "frontend")]
    pub frontend_dir: String,

    // --- Chat LLM Provider Args ---
    /// Base URL of the Ollama-compatible model service (e.g., http://localhost:11434)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client fall back to localhost
    pub chat_base_url: Option<String>,

    /// Model used when a request does not name one (e.g., tinyllama, llama3)
    #[arg(long, env = "CHAT_MODEL", default_value = "tinyllama")]
    pub chat_model: String,

    /// Sampling temperature used when a request does not set one.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub temperature: f64,

    /// System prompt sent ahead of the conversation. Empty disables it.
    #[arg(
        long,
        env = "SYSTEM_PROMPT",
        default_value = "You are a friendly and helpful AI assistant."
    )]
    pub system_prompt: String,

    /// Connect and read deadline for model service calls, in seconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "30")]
    pub upstream_timeout_secs: u64,

    // --- History Store Args ---
    /// History chat store type (file, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "file")]
    pub history_type: String,

    /// Path of the conversation file when HISTORY_TYPE is file.
    #[arg(long, env = "HISTORY_PATH", default_value = "chatlog.json")]
    pub history_path: String,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
