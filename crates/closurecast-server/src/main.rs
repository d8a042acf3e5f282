//! ClosureCast Server
//!
//! Serves closure-risk predictions from a trained model artifact and answers
//! questions grounded in a static knowledge corpus.

use anyhow::Result;
use clap::Parser;
use closurecast_server::{
    create_router, init_metrics, init_tracing, shutdown_signal, AppState, Cli, ServerConfig,
};
use std::net::SocketAddr;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting ClosureCast server");

    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Model: {}", config.model_path);
    info!("Documents: {}", config.corpus_path);
    info!("Generation model: {}", config.gemini.model);

    let metrics_handle = init_metrics()?;

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;

    let state = AppState::initialize(config)?.with_metrics_handle(metrics_handle);
    info!(
        model_loaded = state.model_loaded(),
        document_loaded = state.corpus_loaded,
        gemini_client_initialized = state.generator.is_some(),
        "Application state initialized"
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
