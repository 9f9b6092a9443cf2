pub mod json_store;
pub mod manager;
pub mod models;
pub mod repository;
pub mod sql_store;

pub use json_store::JsonStore;
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::InventoryRepository;
pub use sql_store::SqlStore;
