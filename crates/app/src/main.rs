//! Order pipeline entry point.

use std::sync::Arc;

use app::{Config, LogFormat, Pipeline};
use common::SystemClock;
use domain::InMemoryProductCatalog;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Declare the broker layout and wire producer and consumers
    let pipeline = Pipeline::build(
        &config,
        InMemoryProductCatalog::new(),
        Arc::new(SystemClock),
    )
    .await;

    // 4. Start consumers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listeners = pipeline.spawn_listeners(shutdown_rx);

    // 5. Start ops server
    let app = app::create_app(pipeline.health_state(), metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting ops server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Let in-flight deliveries finish
    let _ = shutdown_tx.send(true);
    if let Err(e) = listeners.join().await {
        tracing::error!(error = %e, "listener shutdown failed");
    }

    tracing::info!("server shut down gracefully");
}
