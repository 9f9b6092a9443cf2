use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::Item;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ItemForm;

/// GET /api/items - Items owned by the session user, ordered by SKU
pub async fn get(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<Item>> {
    let items = state.service.list_items(auth.id).await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/items - Create an item
///
/// Expected Input:
/// ```json
/// {
///   "sku": "string",            // Required, unique per user
///   "name": "string",           // Required
///   "qty": 3,                   // Number or digit string, otherwise 0
///   "location": "string",
///   "category": "string",
///   "description": "string",
///   "purchase_price": 12.5      // Number or numeric string, otherwise 0.0
/// }
/// ```
pub async fn post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<ItemForm>, JsonRejection>,
) -> ApiResult<Item> {
    let Json(form) = payload?;
    let item = state.service.create_item(auth.id, form).await?;
    Ok(ApiResponse::created(item))
}
