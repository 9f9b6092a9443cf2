use async_trait::async_trait;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Item, ItemRow, NewUser, User, UserId};
use crate::database::repository::InventoryRepository;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      VARCHAR(80)  NOT NULL UNIQUE,
        email         VARCHAR(200) NOT NULL,
        password_hash VARCHAR(200) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id             VARCHAR(36)  PRIMARY KEY,
        sku            VARCHAR(120) NOT NULL,
        name           VARCHAR(200) NOT NULL,
        qty            INTEGER      NOT NULL DEFAULT 0,
        location       VARCHAR(200),
        category       VARCHAR(200),
        description    TEXT,
        purchase_price REAL         NOT NULL DEFAULT 0.0,
        owner_id       INTEGER      NOT NULL REFERENCES users(id),
        CONSTRAINT uix_owner_sku UNIQUE (owner_id, sku)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_items_owner ON items (owner_id)",
];

const ITEM_COLUMNS: &str =
    "id, sku, name, qty, location, category, description, purchase_price, owner_id";

/// Relational backend: `users` and `items` tables with uniqueness
/// enforced by the schema.
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// Wraps `pool` and creates the schema if it does not exist yet.
    pub async fn new(pool: SqlitePool) -> Result<Self, DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Start a transaction for multi-step writes. Dropping it without
    /// [`SqlTransaction::commit`] rolls everything back.
    pub async fn begin(&self) -> Result<SqlTransaction, DatabaseError> {
        Ok(SqlTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

/// Writes that become visible together on [`commit`](SqlTransaction::commit).
pub struct SqlTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl SqlTransaction {
    pub async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DatabaseError> {
        select_user_by_username(&mut *self.tx, username).await
    }

    pub async fn insert_user(&mut self, user: NewUser) -> Result<User, DatabaseError> {
        insert_user_with(&mut *self.tx, user).await
    }

    pub async fn insert_item(&mut self, item: Item) -> Result<Item, DatabaseError> {
        insert_item_with(&mut *self.tx, item).await
    }

    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}

async fn select_user_by_username<'e, E: SqliteExecutor<'e>>(
    executor: E,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(executor)
    .await?;
    Ok(user)
}

async fn insert_user_with<'e, E: SqliteExecutor<'e>>(executor: E, user: NewUser) -> Result<User, DatabaseError> {
    let result = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(executor)
        .await;

    match result {
        Ok(done) => {
            debug!("Inserted user {} ({})", user.username, done.last_insert_rowid());
            Ok(User {
                id: done.last_insert_rowid(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
            })
        }
        Err(e) if is_unique_violation(&e) => Err(DatabaseError::DuplicateUsername(user.username)),
        Err(e) => Err(e.into()),
    }
}

async fn insert_item_with<'e, E: SqliteExecutor<'e>>(executor: E, item: Item) -> Result<Item, DatabaseError> {
    let sql = format!("INSERT INTO items ({ITEM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)");
    let result = sqlx::query(&sql)
        .bind(item.id.to_string())
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.qty)
        .bind(&item.location)
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.purchase_price)
        .bind(item.owner_id)
        .execute(executor)
        .await;

    match result {
        Ok(_) => Ok(item),
        Err(e) if is_unique_violation(&e) => Err(DatabaseError::DuplicateSku(item.sku)),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl InventoryRepository for SqlStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        select_user_by_username(&self.pool, username).await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        insert_user_with(&self.pool, user).await
    }

    async fn list_items(&self, owner: UserId) -> Result<Vec<Item>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = ? ORDER BY sku");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Item::try_from).transpose()
    }

    async fn insert_item(&self, item: Item) -> Result<Item, DatabaseError> {
        insert_item_with(&self.pool, item).await
    }

    async fn update_item(&self, item: &Item) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?, qty = ?, location = ?, category = ?, description = ?, purchase_price = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.name)
        .bind(item.qty)
        .bind(&item.location)
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.purchase_price)
        .bind(item.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("item {}", item.id)));
        }
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
