// handlers/protected/manage/info.rs - GET/POST /api/Users/manage/info

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::public::users::send_confirmation_email;
use crate::identity::{IdentityErrorDescriber, IdentityErrors, UserManager};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::current_user;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub email: Option<String>,
    pub is_email_confirmed: bool,
}

impl From<&User> for InfoResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            is_email_confirmed: user.email_confirmed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRequest {
    pub new_email: Option<String>,
    pub new_password: Option<String>,
    pub old_password: Option<String>,
}

pub async fn info_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<InfoResponse> {
    let user = current_user(&state, &auth).await?;
    Ok(ApiResponse::success(InfoResponse::from(&user)))
}

/// Change password and/or start an email change. The new address only takes
/// effect once the link mailed to it is followed.
pub async fn info_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<InfoRequest>,
) -> ApiResult<InfoResponse> {
    let mut user = current_user(&state, &auth).await?;

    let new_email = request.new_email.as_deref().filter(|e| !e.is_empty());
    let new_password = request.new_password.as_deref().filter(|p| !p.is_empty());

    if let Some(email) = new_email {
        if !UserManager::is_valid_email(email) {
            let errors = IdentityErrors::single(IdentityErrorDescriber::invalid_email(email));
            return Err(ApiError::validation(errors.into_field_errors()));
        }
    }

    if let Some(password) = new_password {
        let Some(old_password) = request.old_password.as_deref().filter(|p| !p.is_empty()) else {
            return Err(ApiError::validation_error(
                "OldPasswordRequired",
                "The old password is required to set a new password. If the old password is forgotten, use /resetPassword.",
            ));
        };
        state.users.change_password(&mut user, old_password, password).await?;
        tracing::info!("User {} changed their password", user.id);
    }

    if let Some(email) = new_email {
        if user.email.as_deref() != Some(email) {
            send_confirmation_email(&state, &user, email, true).await?;
        }
    }

    Ok(ApiResponse::success(InfoResponse::from(&user)))
}
