// handlers/public/health.rs - GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::app::AppState;

pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "Healthy"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Unhealthy")
        }
    }
}
