use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::parse_item_id;
use crate::app::AppState;
use crate::database::models::Item;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ItemForm;

/// GET /api/items/:id - Show one item
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Item> {
    let id = parse_item_id(&id)?;
    let item = state.service.get_item(auth.id, id).await?;
    Ok(ApiResponse::success(item))
}

/// PUT /api/items/:id - Edit an item
///
/// Same body as create; `sku` is ignored because it cannot change.
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<ItemForm>, JsonRejection>,
) -> ApiResult<Item> {
    let id = parse_item_id(&id)?;
    let Json(form) = payload?;
    let item = state.service.update_item(auth.id, id, form).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/items/:id - Delete an item
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_item_id(&id)?;
    state.service.delete_item(auth.id, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
