// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegisterForm;

/// POST /auth/register - Create a new account
///
/// Expected Input:
/// ```json
/// {
///   "username": "string",
///   "email": "string",
///   "password": "string",
///   "confirm": "string"
/// }
/// ```
///
/// Errors:
/// - 400 `All fields are required` / `Passwords do not match`
/// - 409 `Username already exists`
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(form) = payload?;
    let user = state.service.register(form).await?;

    Ok(ApiResponse::created(json!({
        "user": UserProfile::from(&user),
        "message": "Account created - please sign in"
    })))
}
