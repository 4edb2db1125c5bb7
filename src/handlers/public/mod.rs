// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service index, health probe, and the account endpoints used to obtain
// credentials: register, login, refresh, email confirmation, password reset
// and external sign-in.

pub mod health;
pub mod index;
pub mod users;

pub use health::health_get;
pub use index::{api_get, root_get};
