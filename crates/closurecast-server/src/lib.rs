//! ClosureCast Server
//!
//! HTTP front end for closure-risk prediction and the knowledge chat:
//! `/options`, `/predict`, `/chat`, `/health` and `/metrics`.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::{create_router, AppError};
pub use state::AppState;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::info;

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("closurecast=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("closurecast=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and return the handle for rendering
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "closurecast_requests_total",
        "Total number of requests by route"
    );
    metrics::describe_counter!("closurecast_errors_total", "Total number of errors by kind");
    metrics::describe_counter!(
        "closurecast_generation_retries_total",
        "Generation retries after quota exhaustion"
    );
    metrics::describe_histogram!(
        "closurecast_predict_latency_us",
        metrics::Unit::Microseconds,
        "Feature building and inference latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
