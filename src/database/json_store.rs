use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Item, NewUser, User, UserId};
use crate::database::repository::InventoryRepository;
use crate::services::forms::{coerce_price, coerce_qty};

pub const USERS_FILE: &str = "users.json";
pub const ITEMS_FILE: &str = "items.json";

/// `users.json` entry, keyed by username. Legacy files have no `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password_hash: String,
}

/// `items.json` entry, keyed by UUID. Legacy files key by SKU and carry
/// neither `sku` nor `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredItem {
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_qty")]
    qty: i64,
    #[serde(default)]
    location: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "lenient_price")]
    purchase_price: f64,
    #[serde(default)]
    owner_id: Option<UserId>,
}

// Older writers stored whatever the form held, including digit strings and
// integers wider than i64. Those load as 0 instead of failing the store.
fn lenient_qty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(coerce_qty(&Value::deserialize(deserializer)?))
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(coerce_price(&Value::deserialize(deserializer)?))
}

/// An item carried over from the legacy layout that nobody owns yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanItem {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub qty: i64,
    pub location: String,
    pub category: String,
    pub description: String,
    pub purchase_price: f64,
}

impl OrphanItem {
    pub fn into_item(self, owner_id: UserId) -> Item {
        Item {
            id: self.id,
            sku: self.sku,
            name: self.name,
            qty: self.qty,
            location: self.location,
            category: self.category,
            description: self.description,
            purchase_price: self.purchase_price,
            owner_id,
        }
    }
}

impl StoredItem {
    fn sku(&self) -> &str {
        self.sku.as_deref().unwrap_or_default()
    }

    fn to_item(&self, id: Uuid) -> Option<Item> {
        Some(Item {
            id,
            sku: self.sku().to_string(),
            name: self.name.clone(),
            qty: self.qty,
            location: self.location.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            purchase_price: self.purchase_price,
            owner_id: self.owner_id?,
        })
    }

    fn from_item(item: &Item) -> Self {
        Self {
            sku: Some(item.sku.clone()),
            name: item.name.clone(),
            qty: item.qty,
            location: item.location.clone(),
            category: item.category.clone(),
            description: item.description.clone(),
            purchase_price: item.purchase_price,
            owner_id: Some(item.owner_id),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct JsonState {
    users: BTreeMap<String, StoredUser>,
    items: BTreeMap<Uuid, StoredItem>,
}

impl JsonState {
    fn next_user_id(&self) -> UserId {
        self.users.values().filter_map(|u| u.id).max().unwrap_or(0) + 1
    }

    fn user(&self, username: &str, stored: &StoredUser) -> Option<User> {
        Some(User {
            id: stored.id?,
            username: username.to_string(),
            email: stored.email.clone(),
            password_hash: stored.password_hash.clone(),
        })
    }
}

/// Flat-file backend. The whole store lives in memory behind one lock and
/// every mutation rewrites the affected file before it becomes visible.
pub struct JsonStore {
    dir: PathBuf,
    state: Mutex<JsonState>,
}

impl JsonStore {
    /// Load `users.json` and `items.json` from `dir`, upgrading the legacy
    /// layout in place.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let mut users: BTreeMap<String, StoredUser> = read_map(&dir.join(USERS_FILE)).await?;
        let raw_items: BTreeMap<String, StoredItem> = read_map(&dir.join(ITEMS_FILE)).await?;

        let mut upgraded_users = 0usize;
        let mut next_id = users.values().filter_map(|u| u.id).max().unwrap_or(0) + 1;
        for user in users.values_mut().filter(|u| u.id.is_none()) {
            user.id = Some(next_id);
            next_id += 1;
            upgraded_users += 1;
        }

        let mut upgraded_items = 0usize;
        let mut items = BTreeMap::new();
        for (key, mut item) in raw_items {
            match Uuid::parse_str(&key) {
                Ok(id) if item.sku.is_some() => {
                    items.insert(id, item);
                }
                _ => {
                    // Legacy entry keyed by SKU.
                    if item.sku.is_none() {
                        item.sku = Some(key);
                    }
                    items.insert(Uuid::new_v4(), item);
                    upgraded_items += 1;
                }
            }
        }

        let store = Self {
            dir,
            state: Mutex::new(JsonState { users, items }),
        };

        if upgraded_users > 0 || upgraded_items > 0 {
            info!(
                "Upgraded legacy JSON store: {} users given ids, {} items given UUID keys",
                upgraded_users, upgraded_items
            );
            let state = store.state.lock().await;
            store.write_users(&state.users).await?;
            store.write_items(&state.items).await?;
        }

        Ok(store)
    }

    /// Items without an owner, left over from the legacy layout.
    pub async fn orphaned_items(&self) -> Vec<OrphanItem> {
        let state = self.state.lock().await;
        let mut orphans: Vec<OrphanItem> = state
            .items
            .iter()
            .filter(|(_, item)| item.owner_id.is_none())
            .map(|(id, item)| OrphanItem {
                id: *id,
                sku: item.sku().to_string(),
                name: item.name.clone(),
                qty: item.qty,
                location: item.location.clone(),
                category: item.category.clone(),
                description: item.description.clone(),
                purchase_price: item.purchase_price,
            })
            .collect();
        orphans.sort_by(|a, b| a.sku.cmp(&b.sku));
        orphans
    }

    async fn write_users(&self, users: &BTreeMap<String, StoredUser>) -> Result<(), DatabaseError> {
        write_atomic(&self.dir.join(USERS_FILE), users).await
    }

    async fn write_items(&self, items: &BTreeMap<Uuid, StoredItem>) -> Result<(), DatabaseError> {
        write_atomic(&self.dir.join(ITEMS_FILE), items).await
    }
}

async fn read_map<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>, DatabaseError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&text).map_err(|e| {
        warn!("Refusing to load {}: {}", path.display(), e);
        DatabaseError::Corrupt(format!("{}: {}", path.display(), e))
    })
}

async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), DatabaseError> {
    let body = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl InventoryRepository for JsonStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(username)
            .and_then(|stored| state.user(username, stored)))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|(_, stored)| stored.id == Some(id))
            .and_then(|(name, stored)| state.user(name, stored)))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter_map(|(name, stored)| state.user(name, stored))
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.lock().await;
        if state.users.contains_key(&user.username) {
            return Err(DatabaseError::DuplicateUsername(user.username));
        }

        let id = state.next_user_id();
        let mut users = state.users.clone();
        users.insert(
            user.username.clone(),
            StoredUser {
                id: Some(id),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        self.write_users(&users).await?;
        state.users = users;

        Ok(User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        })
    }

    async fn list_items(&self, owner: UserId) -> Result<Vec<Item>, DatabaseError> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state
            .items
            .iter()
            .filter(|(_, item)| item.owner_id == Some(owner))
            .filter_map(|(id, item)| item.to_item(*id))
            .collect();
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let state = self.state.lock().await;
        Ok(state.items.get(&id).and_then(|item| item.to_item(id)))
    }

    async fn insert_item(&self, item: Item) -> Result<Item, DatabaseError> {
        let mut state = self.state.lock().await;
        let taken = state.items.contains_key(&item.id)
            || state
                .items
                .values()
                .any(|existing| existing.owner_id == Some(item.owner_id) && existing.sku() == item.sku);
        if taken {
            return Err(DatabaseError::DuplicateSku(item.sku));
        }

        let mut items = state.items.clone();
        items.insert(item.id, StoredItem::from_item(&item));
        self.write_items(&items).await?;
        state.items = items;
        Ok(item)
    }

    async fn update_item(&self, item: &Item) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        match state.items.get(&item.id) {
            Some(existing) if existing.owner_id.is_some() => {}
            _ => return Err(DatabaseError::NotFound(format!("item {}", item.id))),
        }

        let mut items = state.items.clone();
        if let Some(existing) = items.get_mut(&item.id) {
            existing.name = item.name.clone();
            existing.qty = item.qty;
            existing.location = item.location.clone();
            existing.category = item.category.clone();
            existing.description = item.description.clone();
            existing.purchase_price = item.purchase_price;
        }
        self.write_items(&items).await?;
        state.items = items;
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut state = self.state.lock().await;
        if !state.items.contains_key(&id) {
            return Ok(false);
        }

        let mut items = state.items.clone();
        items.remove(&id);
        self.write_items(&items).await?;
        state.items = items;
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        let meta = tokio::fs::metadata(&self.dir).await?;
        if !meta.is_dir() {
            return Err(DatabaseError::NotFound(format!("data directory {}", self.dir.display())));
        }
        Ok(())
    }
}
