// handlers/protected/manage/mod.rs - /api/Users/manage endpoints

pub mod info;
pub mod two_factor;

pub use info::{info_get, info_post};
pub use two_factor::two_factor_post;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// The signed-in principal's user row; 404 once the account is gone
pub(crate) async fn current_user(state: &AppState, auth: &AuthUser) -> Result<User, ApiError> {
    state
        .users
        .find_by_id(&auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unable to load user with ID '{}'.", auth.id)))
}
