pub mod forms;
pub mod import_service;
pub mod inventory_service;

pub use forms::{ItemForm, LoginForm, RegisterForm};
pub use import_service::{import_json, ImportReport};
pub use inventory_service::{InventoryError, InventoryService};
