pub mod manager;
pub mod models;
pub mod roles;
pub mod seed;
pub mod todo_items;
pub mod todo_lists;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
