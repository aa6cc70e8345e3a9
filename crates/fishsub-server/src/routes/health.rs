use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::state::SharedState;

/// `GET /health` — liveness probe; touches the database pool so a broken
/// connection shows up as unhealthy rather than a silent 200 (spec §6).
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "database unreachable"),
    }
}

/// `GET /metrics` — Prometheus text exposition of the counter snapshot
/// (spec §6, C10).
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        fishsub_core::metrics::METRICS.render(),
    )
}
