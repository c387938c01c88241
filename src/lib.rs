pub mod cli;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod relay;
pub mod server;

use cli::Args;
use history::create_history_store;
use llm::LlmConfig;
use llm::chat::{ new_client, ChatClient };
use log::info;
use relay::{ RelayService, RelaySettings };
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let llm_config = LlmConfig::from_args(&args);
    let settings = RelaySettings::from_args(&args);

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Frontend Dir: {}", args.frontend_dir);
    info!(
        "Model Service: {}",
        llm_config.base_url.as_deref().unwrap_or(llm::DEFAULT_BASE_URL)
    );
    info!("Default Model: {}", settings.default_model);
    info!("Default Temperature: {}", settings.default_temperature);
    info!("System Prompt: {}", if settings.system_prompt.is_some() { "enabled" } else { "disabled" });
    info!("Upstream Timeout: {}s", args.upstream_timeout_secs);
    info!("History Store Type: {}", args.history_type);
    if args.history_type.eq_ignore_ascii_case("file") {
        info!("History Path: {}", args.history_path);
    }
    info!("-------------------------");

    let store = create_history_store(&args).await?;
    let client = new_client(&llm_config)?;
    info!("Chat client configured: BaseURL={}", client.get_base_url());

    let relay = Arc::new(RelayService::new(store, client, settings));
    let server = Server::new(args.server_addr.clone(), relay, args.clone());
    server.run().await?;

    Ok(())
}
