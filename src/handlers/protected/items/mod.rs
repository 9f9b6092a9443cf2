pub mod collection;
pub mod record;

use uuid::Uuid;

use crate::error::ApiError;

// Re-export handler functions for use in routing
pub use collection::get as items_get;
pub use collection::post as items_post;
pub use record::delete as item_delete;
pub use record::get as item_get;
pub use record::put as item_put;

/// Ids that are not UUIDs cannot name an item, so they are simply not found.
pub fn parse_item_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found(format!("Item {} not found", id)))
}
