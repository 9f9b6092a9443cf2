use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::database::json_store::JsonStore;
use crate::database::repository::InventoryRepository;
use crate::database::sql_store::SqlStore;

/// Errors from the storage backends
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("SKU already exists: {0}")]
    DuplicateSku(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the configured storage backend.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn open(config: &StorageConfig) -> Result<Arc<dyn InventoryRepository>, DatabaseError> {
        match config.backend {
            StorageBackend::Json => {
                let store = JsonStore::open(&config.data_dir).await?;
                info!("Using JSON storage in {}", config.data_dir.display());
                Ok(Arc::new(store))
            }
            StorageBackend::Sqlite => {
                let pool = Self::connect(&config.database_url, config.max_connections).await?;
                let store = SqlStore::new(pool).await?;
                info!("Using SQLite storage at {}", config.database_url);
                Ok(Arc::new(store))
            }
        }
    }

    /// Create a pool for `database_url`, creating the file if needed.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, DatabaseError> {
        if !database_url.starts_with("sqlite:") {
            return Err(DatabaseError::InvalidDatabaseUrl(database_url.to_string()));
        }
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl(database_url.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        info!("Created database pool for: {}", database_url);
        Ok(pool)
    }

    /// Single-connection in-memory pool. The connection is never recycled,
    /// otherwise the database would vanish with it.
    pub async fn in_memory() -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|_| DatabaseError::InvalidDatabaseUrl("sqlite::memory:".to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(pool)
    }
}
