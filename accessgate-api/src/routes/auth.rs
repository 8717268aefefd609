/// Login verification
///
/// Checks an email/password pair against the stored hash. No session or
/// token is issued; callers only learn whether the pair is valid.
///
/// # Endpoints
///
/// - `POST /login` - Verify credentials

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use accessgate_shared::{auth::password, models::user::normalize_email, store::StoreError};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: SecretString,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Always `"success"`
    pub status: String,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "email": "ana@example.com",
///   "password": "Xy7kP2qa"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "status": "success" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `401 Unauthorized`: Unknown email or wrong password (same body for both)
/// - `422 Unprocessable Entity`: Invalid email syntax
/// - `500 Internal Server Error`: Store failure or timeout
#[tracing::instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let email = normalize_email(&req.email);
    let timeout = state.config.webhook.provisioning.store_timeout;

    let user = tokio::time::timeout(timeout, state.store.find_by_email(&email))
        .await
        .map_err(|_| StoreError::Timeout(timeout))??;

    let Some(user) = user else {
        tracing::info!("Login rejected");
        return Err(ApiError::InvalidCredentials);
    };

    let password = req.password.expose_secret().to_string();
    if !password::verify_password_blocking(password, user.password_hash).await {
        tracing::info!("Login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "Login succeeded");

    Ok(Json(LoginResponse {
        status: "success".to_string(),
    }))
}
