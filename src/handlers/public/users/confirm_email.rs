// handlers/public/users/confirm_email.rs - GET /api/Users/confirmEmail, POST /api/Users/resendConfirmationEmail

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use url::Url;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// Mail the user a link back to `confirmEmail`. For an address change the
/// token is bound to the new address and the link carries it as `changedEmail`.
pub async fn send_confirmation_email(
    state: &AppState,
    user: &User,
    email: &str,
    is_change: bool,
) -> Result<(), ApiError> {
    let code = if is_change {
        state.users.generate_change_email_token(user, email)?
    } else {
        state.users.generate_email_confirmation_token(user)?
    };

    let mut params = vec![("userId", user.id.as_str()), ("code", code.as_str())];
    if is_change {
        params.push(("changedEmail", email));
    }

    let endpoint = format!(
        "{}/api/Users/confirmEmail",
        state.config.api.public_base_url.trim_end_matches('/')
    );
    let link = Url::parse_with_params(&endpoint, &params)
        .map_err(|e| ApiError::internal_server_error(format!("Invalid public base url: {}", e)))?;

    state.email.send_confirmation_link(user, email, link.as_str()).await;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEmailQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub code: String,
    pub changed_email: Option<String>,
}

pub async fn confirm_email_get(
    State(state): State<AppState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<&'static str, ApiError> {
    // Unknown users get the same answer as bad codes
    let Some(mut user) = state.users.find_by_id(&query.user_id).await? else {
        return Err(ApiError::unauthorized());
    };

    let result = match query.changed_email.as_deref().filter(|e| !e.is_empty()) {
        Some(new_email) => state.users.change_email(&mut user, new_email, &query.code).await,
        None => state.users.confirm_email(&mut user, &query.code).await,
    };

    if let Err(e) = result {
        tracing::debug!("Email confirmation failed for {}: {}", query.user_id, e);
        return Err(ApiError::unauthorized());
    }

    Ok("Thank you for confirming your email.")
}

#[derive(Debug, Deserialize)]
pub struct ResendConfirmationRequest {
    #[serde(default)]
    pub email: String,
}

/// Always 200 so the endpoint does not reveal which addresses are registered
pub async fn resend_confirmation_email_post(
    State(state): State<AppState>,
    Json(request): Json<ResendConfirmationRequest>,
) -> ApiResult<()> {
    if let Some(user) = state.users.find_by_email(&request.email).await? {
        send_confirmation_email(&state, &user, &request.email, false).await?;
    }
    Ok(ApiResponse::ok())
}
