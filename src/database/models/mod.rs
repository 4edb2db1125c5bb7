pub mod todo;
pub mod user;

pub use todo::{AuditStamp, TodoItem, TodoList};
pub use user::{Role, User, UserLogin};
