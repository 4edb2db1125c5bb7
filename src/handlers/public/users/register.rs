// handlers/public/users/register.rs - POST /api/Users/register

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::identity::{IdentityErrorDescriber, IdentityErrors, UserManager};
use crate::middleware::{ApiResponse, ApiResult};

use super::send_confirmation_email;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register_post(
    State(state): State<AppState>,
    Json(registration): Json<RegisterRequest>,
) -> ApiResult<()> {
    let email = registration.email.as_str();
    if !UserManager::is_valid_email(email) {
        let errors = IdentityErrors::single(IdentityErrorDescriber::invalid_email(email));
        return Err(ApiError::validation(errors.into_field_errors()));
    }

    let user = state
        .users
        .create(UserManager::new_user(email), Some(&registration.password))
        .await?;

    send_confirmation_email(&state, &user, email, false).await?;
    Ok(ApiResponse::ok())
}
