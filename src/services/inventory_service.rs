use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{self, AuthError};
use crate::database::manager::DatabaseError;
use crate::database::models::{Item, NewUser, User, UserId};
use crate::database::repository::InventoryRepository;
use crate::services::forms::{
    check_len, ItemForm, LoginForm, RegisterForm, MAX_EMAIL_LEN, MAX_PASSWORD_BYTES, MAX_SKU_LEN,
    MAX_USERNAME_LEN,
};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("SKU already exists")]
    SkuTaken,
    #[error("Item {0} not found")]
    ItemNotFound(Uuid),
    #[error("Item {0} belongs to another user")]
    NotOwner(Uuid),
    #[error(transparent)]
    Database(DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl InventoryError {
    fn validation(message: impl Into<String>) -> Self {
        InventoryError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    fn fields(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        InventoryError::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }
}

impl From<DatabaseError> for InventoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DuplicateUsername(_) => InventoryError::UsernameTaken,
            DatabaseError::DuplicateSku(_) => InventoryError::SkuTaken,
            other => InventoryError::Database(other),
        }
    }
}

/// Registration, login and per-owner item CRUD on top of a repository.
#[derive(Clone)]
pub struct InventoryService {
    repo: Arc<dyn InventoryRepository>,
    bcrypt_cost: u32,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn InventoryRepository>, bcrypt_cost: u32) -> Self {
        Self { repo, bcrypt_cost }
    }

    pub fn repository(&self) -> &Arc<dyn InventoryRepository> {
        &self.repo
    }

    pub async fn register(&self, form: RegisterForm) -> Result<User, InventoryError> {
        let username = form.username.trim().to_string();
        let email = form.email.trim().to_string();

        if username.is_empty() || email.is_empty() || form.password.is_empty() {
            return Err(InventoryError::validation("All fields are required"));
        }
        if form.password != form.confirm {
            let mut errors = HashMap::new();
            errors.insert("confirm".to_string(), "Does not match password".to_string());
            return Err(InventoryError::fields("Passwords do not match", errors));
        }

        let mut errors = HashMap::new();
        check_len(&mut errors, "username", &username, MAX_USERNAME_LEN);
        check_len(&mut errors, "email", &email, MAX_EMAIL_LEN);
        if form.password.len() > MAX_PASSWORD_BYTES {
            errors.insert(
                "password".to_string(),
                format!("Must be at most {} bytes", MAX_PASSWORD_BYTES),
            );
        }
        if !errors.is_empty() {
            return Err(InventoryError::fields("Invalid field length", errors));
        }

        // Cheap check before paying for the hash; insert_user still decides.
        if self.repo.find_user_by_username(&username).await?.is_some() {
            return Err(InventoryError::UsernameTaken);
        }

        let cost = self.bcrypt_cost;
        let password = form.password;
        let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password, cost)).await??;

        let user = self
            .repo
            .insert_user(NewUser {
                username,
                email,
                password_hash,
            })
            .await?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn authenticate(&self, form: LoginForm) -> Result<User, InventoryError> {
        let username = form.username.trim();
        let Some(user) = self.repo.find_user_by_username(username).await? else {
            warn!("Login failed for unknown user");
            return Err(InventoryError::InvalidCredentials);
        };

        // Registration never accepts more than bcrypt reads, so a longer
        // password can only match by truncation.
        if form.password.len() > MAX_PASSWORD_BYTES {
            warn!("Login failed for user {}", user.id);
            return Err(InventoryError::InvalidCredentials);
        }

        let hash = user.password_hash.clone();
        let password = form.password;
        let verified = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash)).await?;
        if !verified {
            warn!("Login failed for user {}", user.id);
            return Err(InventoryError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, InventoryError> {
        Ok(self.repo.find_user(id).await?)
    }

    pub async fn list_items(&self, owner: UserId) -> Result<Vec<Item>, InventoryError> {
        Ok(self.repo.list_items(owner).await?)
    }

    /// The item, provided `owner` owns it.
    pub async fn get_item(&self, owner: UserId, id: Uuid) -> Result<Item, InventoryError> {
        let item = self
            .repo
            .find_item(id)
            .await?
            .ok_or(InventoryError::ItemNotFound(id))?;
        if item.owner_id != owner {
            warn!("User {} denied access to item {}", owner, id);
            return Err(InventoryError::NotOwner(id));
        }
        Ok(item)
    }

    pub async fn create_item(&self, owner: UserId, form: ItemForm) -> Result<Item, InventoryError> {
        let sku = form.trimmed_sku().to_string();
        if sku.is_empty() || form.trimmed_name().is_empty() {
            return Err(InventoryError::validation("SKU and name required"));
        }

        let mut errors = HashMap::new();
        check_len(&mut errors, "sku", &sku, MAX_SKU_LEN);
        let changes = form.changes(&mut errors);
        if !errors.is_empty() {
            return Err(InventoryError::fields("Invalid item fields", errors));
        }

        let mut item = Item {
            id: Uuid::new_v4(),
            sku,
            name: String::new(),
            qty: 0,
            location: String::new(),
            category: String::new(),
            description: String::new(),
            purchase_price: 0.0,
            owner_id: owner,
        };
        item.apply(changes);

        let item = self.repo.insert_item(item).await?;
        info!("User {} created item {} ({})", owner, item.id, item.sku);
        Ok(item)
    }

    /// Replaces the mutable fields. The SKU never changes.
    pub async fn update_item(&self, owner: UserId, id: Uuid, form: ItemForm) -> Result<Item, InventoryError> {
        let mut item = self.get_item(owner, id).await?;

        if form.trimmed_name().is_empty() {
            return Err(InventoryError::validation("Name required"));
        }
        let mut errors = HashMap::new();
        let changes = form.changes(&mut errors);
        if !errors.is_empty() {
            return Err(InventoryError::fields("Invalid item fields", errors));
        }

        item.apply(changes);
        self.repo.update_item(&item).await?;
        Ok(item)
    }

    pub async fn delete_item(&self, owner: UserId, id: Uuid) -> Result<(), InventoryError> {
        self.get_item(owner, id).await?;
        if !self.repo.delete_item(id).await? {
            return Err(InventoryError::ItemNotFound(id));
        }
        info!("User {} deleted item {}", owner, id);
        Ok(())
    }
}
