/// Liveness and health endpoints
///
/// # Endpoints
///
/// ```text
/// GET  /        liveness, no dependencies touched
/// HEAD /        same, empty body
/// GET  /health  liveness plus user store connectivity
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Liveness message
pub const LIVENESS_MESSAGE: &str = "accessgate API is up";

/// Root liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    /// Liveness text
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Root liveness handler
///
/// Mounted with `get`, so axum also answers `HEAD /` with the same status
/// and headers and an empty body.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: LIVENESS_MESSAGE.to_string(),
    })
}

/// Health check handler
///
/// Returns service health status including user store connectivity.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let timeout = state.config.webhook.provisioning.store_timeout;

    let database_status = match tokio::time::timeout(timeout, state.store.ping()).await {
        Ok(Ok(())) => "connected",
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "User store ping failed");
            "disconnected"
        }
        Err(_) => {
            tracing::warn!(?timeout, "User store ping timed out");
            "disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    }))
}
