use axum::Json;
use axum::extract::State;
use broker::InMemoryBroker;
use serde::Serialize;

/// What the health endpoint inspects: the broker and the consumed queues.
#[derive(Clone)]
pub struct HealthState {
    pub broker: InMemoryBroker,
    pub queues: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueueHealth {
    pub queue: String,
    pub depth: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queues: Vec<QueueHealth>,
}

/// `"ok"` while every consumed queue is declared, `"degraded"` otherwise.
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let mut status = "ok";
    let mut queues = Vec::with_capacity(state.queues.len());
    for queue in &state.queues {
        match state.broker.depth(queue).await {
            Ok(depth) => queues.push(QueueHealth {
                queue: queue.clone(),
                depth,
            }),
            Err(e) => {
                tracing::warn!(%queue, error = %e, "Health check could not read queue");
                status = "degraded";
            }
        }
    }
    Json(HealthResponse { status, queues })
}
