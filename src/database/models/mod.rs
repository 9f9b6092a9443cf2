pub mod item;
pub mod user;

pub use item::{Item, ItemChanges, ItemRow};
pub use user::{NewUser, User, UserId, UserProfile};
