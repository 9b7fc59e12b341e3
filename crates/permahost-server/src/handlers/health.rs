use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub repos: u64,
}

impl HealthResponse {
    pub fn up(repos: u64) -> Self {
        Self {
            status: "UP".to_string(),
            repos,
        }
    }

    pub fn down() -> Self {
        Self {
            status: "DOWN".to_string(),
            repos: 0,
        }
    }
}

/// Reports UP with the number of tracked repositories, or DOWN when the
/// store cannot be read.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store().len() {
        Ok(repos) => (StatusCode::OK, Json(HealthResponse::up(repos))),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::down()))
        },
    }
}
