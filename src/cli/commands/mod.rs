pub mod import;
pub mod items;
pub mod users;
