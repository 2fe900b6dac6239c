//! Process host for the order pipeline: configuration, service wiring and
//! the operational HTTP endpoints.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;

use axum::{Router, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

pub use config::{BrokerConfig, Config, LogFormat};
pub use error::AppError;
pub use pipeline::{Pipeline, RunningListeners};
pub use routes::health::HealthState;

/// Builds the operational router: `/health` and `/metrics`.
pub fn create_app(health: HealthState, metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .with_state(health)
        .merge(routes::metrics::metrics_router(metrics_handle))
        .layer(TraceLayer::new_for_http())
}
