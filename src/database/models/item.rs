use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserId;
use crate::database::manager::DatabaseError;

/// A stock item owned by exactly one user. `(owner_id, sku)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub qty: i64,
    pub location: String,
    pub category: String,
    pub description: String,
    pub purchase_price: f64,
    pub owner_id: UserId,
}

/// The mutable part of an item, already trimmed and coerced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemChanges {
    pub name: String,
    pub qty: i64,
    pub location: String,
    pub category: String,
    pub description: String,
    pub purchase_price: f64,
}

impl Item {
    pub fn apply(&mut self, changes: ItemChanges) {
        self.name = changes.name;
        self.qty = changes.qty;
        self.location = changes.location;
        self.category = changes.category;
        self.description = changes.description;
        self.purchase_price = changes.purchase_price;
    }
}

/// Row shape of the `items` table. Ids are stored as 36-char text.
#[derive(Debug, FromRow)]
pub struct ItemRow {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub qty: i64,
    pub location: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub purchase_price: f64,
    pub owner_id: UserId,
}

impl TryFrom<ItemRow> for Item {
    type Error = DatabaseError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|_| DatabaseError::Corrupt(format!("item id '{}' is not a UUID", row.id)))?;
        Ok(Item {
            id,
            sku: row.sku,
            name: row.name,
            qty: row.qty,
            location: row.location.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            purchase_price: row.purchase_price,
            owner_id: row.owner_id,
        })
    }
}
