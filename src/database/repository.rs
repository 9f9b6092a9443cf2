use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Item, NewUser, User, UserId};

/// Storage surface shared by the JSON and SQL backends.
///
/// Uniqueness is enforced here, not by callers: `insert_user` fails with
/// [`DatabaseError::DuplicateUsername`] and `insert_item` with
/// [`DatabaseError::DuplicateSku`] so that both backends reject the same
/// writes even under concurrent requests.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Items owned by `owner`, ordered by SKU.
    async fn list_items(&self, owner: UserId) -> Result<Vec<Item>, DatabaseError>;

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, DatabaseError>;

    async fn insert_item(&self, item: Item) -> Result<Item, DatabaseError>;

    /// Overwrites every mutable column of an existing item.
    async fn update_item(&self, item: &Item) -> Result<(), DatabaseError>;

    /// Returns false when no item had that id.
    async fn delete_item(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
