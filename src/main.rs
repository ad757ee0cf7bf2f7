use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};

mod config;
mod handlers;
mod llm;
mod router;
mod state;
mod studio;
mod utils;

use config::Config;
use llm::GeminiClient;
use router::build_router;
use state::AppState;
use studio::{ImageBackend, Orchestrator, StudioModels};
use utils::logging::init_logging;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::load()?;
    let _guards = init_logging(&config.log_level, &config.log_dir);
    for warning in &config.warnings {
        warn!("{warning}");
    }

    info!(
        outfit_model = %config.outfit_image_model,
        composite_model = %config.composite_image_model,
        "Starting outfit studio"
    );

    let backend: Arc<dyn ImageBackend> = Arc::new(GeminiClient::new(&config)?);
    let orchestrator = Orchestrator::new(
        backend,
        StudioModels {
            outfit_model: config.outfit_image_model.clone(),
            composite_model: config.composite_image_model.clone(),
        },
    );
    let state = AppState::new(orchestrator, &config.download_prefix);
    let app = build_router(state, config.max_upload_bytes, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
