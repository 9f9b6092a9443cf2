use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{clear_session_cookie, session_cookie, ApiResponse, ApiResult};
use crate::services::LoginForm;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
    pub expires_in: u64,
}

/// POST /auth/login - Verify credentials and open a session
///
/// Expected Input:
/// ```json
/// { "username": "string", "password": "string" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": 1, "username": "alice", "email": "alice@example.com" },
///     "expires_in": 604800
///   }
/// }
/// ```
///
/// The token is also set as an HttpOnly session cookie.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginForm>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(form) = payload?;
    let user = state.service.authenticate(form).await?;

    let security = &state.config.security;
    let token = generate_jwt(&Claims::new(&user, security.session_expiry_hours), security).map_err(|e| {
        error!("Failed to issue session token: {}", e);
        ApiError::internal_server_error("Failed to create session")
    })?;

    info!("User {} logged in", user.id);
    let cookie = session_cookie(&token, security)?;
    Ok(ApiResponse::success(LoginResponse {
        token,
        user: UserProfile::from(&user),
        expires_in: security.session_expiry_hours * 3600,
    })
    .with_cookie(cookie))
}

/// POST /auth/logout - Drop the session cookie
///
/// Tokens are stateless, so a bearer token held elsewhere stays valid until
/// it expires.
pub async fn logout(State(state): State<AppState>) -> ApiResult<Value> {
    let cookie = clear_session_cookie(&state.config.security)?;
    Ok(ApiResponse::success(json!({ "logged_out": true })).with_cookie(cookie))
}
