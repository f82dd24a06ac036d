//! Auth HTTP handlers: login.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::error::AppError;
use crate::handlers::http::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    if !state.accounts().authenticate(&body.username, &body.password)? {
        warn!(username = %body.username, "login rejected");
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    }

    let token = state.verifier().issue(&body.username)?;
    info!(username = %body.username, "operator logged in");
    Ok(Json(LoginResponse { token }))
}
