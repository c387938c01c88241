pub mod api;

use crate::cli::Args;
use crate::relay::RelayService;
use log::{ error, info };
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Server {
    addr: String,
    relay: Arc<RelayService>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, relay: Arc<RelayService>, args: Args) -> Self {
        Self { addr, relay, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different address.", self.addr, e);
            e
        })?;
        info!("HTTP server listening on: http://{}", self.addr);
        info!("Frontend available at: http://{}/frontend/", self.addr);

        let app = api::router(self.relay.clone(), &self.args.frontend_dir);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal()).await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
