//! Turning a signed-in user into credentials: bearer token pairs and the application cookie.

use axum_extra::extract::cookie::Cookie;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{cookies, Claims, TokenPurpose};
use crate::database::models::User;
use crate::identity::IdentityError;

/// Body returned by a bearer login or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

async fn principal_claims(
    state: &AppState,
    user: &User,
    purpose: TokenPurpose,
    lifetime: Duration,
) -> Result<Claims, IdentityError> {
    let roles = state.users.roles(user).await?;
    Ok(Claims::new(&user.id, purpose, lifetime)
        .with_stamp(&user.security_stamp)
        .with_identity(Some(user.user_name.clone()), user.email.clone(), roles))
}

/// Fresh access and refresh tokens for the user
pub async fn bearer_tokens(state: &AppState, user: &User) -> Result<AccessTokenResponse, IdentityError> {
    let security = &state.config.security;

    let access = principal_claims(
        state,
        user,
        TokenPurpose::Access,
        Duration::seconds(security.bearer_expiry_secs),
    )
    .await?;
    let refresh = principal_claims(
        state,
        user,
        TokenPurpose::Refresh,
        Duration::days(security.refresh_expiry_days),
    )
    .await?;

    Ok(AccessTokenResponse {
        token_type: "Bearer".to_string(),
        access_token: state.tokens.issue(&access)?,
        expires_in: security.bearer_expiry_secs,
        refresh_token: state.tokens.issue(&refresh)?,
    })
}

/// Sign-in cookie for the user
pub async fn sign_in_cookie(
    state: &AppState,
    user: &User,
    persistent: bool,
) -> Result<Cookie<'static>, IdentityError> {
    let security = &state.config.security;
    let claims = principal_claims(
        state,
        user,
        TokenPurpose::Cookie,
        Duration::days(security.cookie_expiry_days),
    )
    .await?
    .persistent(persistent);

    let value = state.tokens.issue(&claims)?;
    Ok(cookies::application_cookie(value, security, persistent))
}
