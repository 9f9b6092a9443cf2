use axum::Extension;

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - Profile of the session user
///
/// The middleware has already loaded the user for this request, so the
/// profile comes straight from the extension.
pub async fn session_whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(auth.profile()))
}
