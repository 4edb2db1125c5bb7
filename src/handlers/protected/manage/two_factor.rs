// handlers/protected/manage/two_factor.rs - POST /api/Users/manage/2fa

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::current_user;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorRequest {
    pub enable: Option<bool>,
    pub two_factor_code: Option<String>,
    #[serde(default)]
    pub reset_shared_key: bool,
    #[serde(default)]
    pub reset_recovery_codes: bool,
    #[serde(default)]
    pub forget_machine: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorResponse {
    pub shared_key: String,
    pub recovery_codes_left: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_codes: Option<Vec<String>>,
    pub is_two_factor_enabled: bool,
    pub is_machine_remembered: bool,
}

/// Enrol, disable or re-key the authenticator. An empty body just reports status.
pub async fn two_factor_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<TwoFactorRequest>,
) -> ApiResult<TwoFactorResponse> {
    let users = &state.users;
    let mut user = current_user(&state, &auth).await?;

    if request.enable == Some(true) {
        if request.reset_shared_key {
            return Err(ApiError::validation_error(
                "CannotResetSharedKeyAndEnable",
                "Resetting the 2fa shared key must disable 2fa until a 2fa token based on the new shared key is validated.",
            ));
        }
        let Some(code) = request.two_factor_code.as_deref().filter(|c| !c.is_empty()) else {
            return Err(ApiError::validation_error(
                "RequiresTwoFactor",
                "No 2fa token was provided by the request. A valid 2fa token is required to enable 2fa.",
            ));
        };
        if !users.verify_two_factor_code(&user, code) {
            return Err(ApiError::validation_error(
                "InvalidTwoFactorCode",
                "The 2fa token provided by the request was invalid. A valid 2fa token is required to enable 2fa.",
            ));
        }
        users.set_two_factor_enabled(&mut user, true).await?;
        tracing::info!("Two-factor authentication enabled for user {}", user.id);
    } else if request.enable == Some(false) || request.reset_shared_key {
        users.set_two_factor_enabled(&mut user, false).await?;
    }

    if request.reset_shared_key {
        users.reset_authenticator_key(&mut user).await?;
    }

    let recovery_codes = if request.reset_recovery_codes
        || (request.enable == Some(true) && users.recovery_codes_left(&user) == 0)
    {
        Some(users.generate_recovery_codes(&mut user).await?)
    } else {
        None
    };

    if request.forget_machine {
        // No remembered-client cookie is ever issued
        tracing::debug!("forgetMachine requested by user {}; nothing to forget", user.id);
    }

    let shared_key = match user.authenticator_key.clone().filter(|k| !k.is_empty()) {
        Some(key) => key,
        None => users.reset_authenticator_key(&mut user).await?,
    };

    Ok(ApiResponse::success(TwoFactorResponse {
        shared_key,
        recovery_codes_left: recovery_codes
            .as_ref()
            .map_or_else(|| users.recovery_codes_left(&user), Vec::len),
        recovery_codes,
        is_two_factor_enabled: user.two_factor_enabled,
        is_machine_remembered: false,
    }))
}
