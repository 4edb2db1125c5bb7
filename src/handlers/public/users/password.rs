// handlers/public/users/password.rs - POST /api/Users/forgotPassword, POST /api/Users/resetPassword

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::identity::{IdentityErrorDescriber, IdentityErrors};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reset_code: String,
    #[serde(default)]
    pub new_password: String,
}

/// Mails a reset code to confirmed accounts. Answers 200 either way.
pub async fn forgot_password_post(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<()> {
    match state.users.find_by_email(&request.email).await? {
        Some(user) if user.email_confirmed => {
            let code = state.users.generate_password_reset_token(&user)?;
            state.email.send_password_reset_code(&user, &request.email, &code).await;
        }
        _ => tracing::debug!("Password reset requested for unknown or unconfirmed address"),
    }
    Ok(ApiResponse::ok())
}

pub async fn reset_password_post(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    let mut user = match state.users.find_by_email(&request.email).await? {
        Some(user) if user.email_confirmed => user,
        // Same failure as a bad code, so unknown addresses are not revealed
        _ => {
            let errors = IdentityErrors::single(IdentityErrorDescriber::invalid_token());
            return Err(ApiError::validation(errors.into_field_errors()));
        }
    };

    state
        .users
        .reset_password(&mut user, &request.reset_code, &request.new_password)
        .await?;

    tracing::info!("Password reset for user {}", user.id);
    Ok(ApiResponse::ok())
}
