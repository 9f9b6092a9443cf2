use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::auth::validate_jwt;
use crate::config::SecurityConfig;
use crate::database::models::{UserId, UserProfile};
use crate::error::ApiError;

/// The session user as loaded by [`session_auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl AuthUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Session middleware for `/api/*`: validates the token, confirms the user
/// still exists and injects [`AuthUser`] into the request.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let security = &state.config.security;

    let token = extract_session_token(request.headers(), &security.session_cookie_name)
        .map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, security).map_err(|e| {
        warn!("Rejected session token: {}", e);
        ApiError::unauthorized("Invalid or expired session")
    })?;

    let user = state
        .service
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session user no longer exists"))?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        email: user.email,
    });

    Ok(next.run(request).await)
}

/// Bearer token from the Authorization header, falling back to the session cookie.
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, &'static str> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header format")?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Some(_) => Err("Empty session token"),
            None => Err("Authorization header must use Bearer token format"),
        };
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .ok_or("Not logged in")
}

fn cookie_header(value: String) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&value).map_err(|_| ApiError::internal_server_error("Failed to build session cookie"))
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, security: &SecurityConfig) -> Result<HeaderValue, ApiError> {
    let max_age = security.session_expiry_hours * 3600;
    let secure = if security.secure_cookies { "; Secure" } else { "" };
    cookie_header(format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        security.session_cookie_name, token, max_age, secure
    ))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(security: &SecurityConfig) -> Result<HeaderValue, ApiError> {
    let secure = if security.secure_cookies { "; Secure" } else { "" };
    cookie_header(format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
        security.session_cookie_name, secure
    ))
}
