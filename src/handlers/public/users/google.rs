// handlers/public/users/google.rs - Google sign-in challenge and callback
//
// GET /api/Users/sign-in/google?callbackUrl=   → 302 to Google, correlation cookie set
// GET /api/Users/sign-in/google/callback       → sign in (or create) the user, 302 back

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Duration;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::external::{ExternalAuthProvider, ExternalLoginInfo};
use crate::auth::{cookies, session, Claims, TokenPurpose};
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::found;
use crate::types::AuthProvider;

const CALLBACK_PATH: &str = "/api/Users/sign-in/google/callback";

const EXTERNAL_LOGIN_FAILURE: &str = "/sign-in?error=External_login_failure";
const NO_EMAIL_FROM_PROVIDER: &str = "/sign-in?error=No_email_from_provider";
const USER_CREATION_FAILED: &str = "/sign-in?error=User_creation_failed";
const ADD_EXTERNAL_LOGIN_FAILED: &str = "/sign-in?error=Add_external_login_failed";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeQuery {
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn callback_uri(state: &AppState) -> String {
    format!("{}{}", state.config.api.public_base_url.trim_end_matches('/'), CALLBACK_PATH)
}

/// Only same-site paths are followed after sign-in
pub fn local_return_url(url: Option<&str>) -> String {
    match url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\") => url.to_string(),
        _ => "/".to_string(),
    }
}

fn provider(state: &AppState) -> Result<&dyn ExternalAuthProvider, ApiError> {
    state.google.as_deref().ok_or_else(|| {
        ApiError::BadRequest(Some(format!(
            "External provider '{}' is not configured",
            AuthProvider::Google.scheme()
        )))
    })
}

pub async fn google_sign_in_get(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let provider = provider(&state)?;

    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    let return_url = local_return_url(query.callback_url.as_deref());
    let correlation = Claims::new(
        &oauth_state,
        TokenPurpose::Correlation,
        Duration::seconds(cookies::CORRELATION_LIFETIME_SECS),
    )
    .with_data(return_url);

    let cookie = cookies::correlation_cookie(state.tokens.issue(&correlation)?, &state.config.security);
    let location = provider.authorization_url(&oauth_state, &callback_uri(&state));

    Ok((jar.add(cookie), found(&location)).into_response())
}

pub async fn google_callback_get(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let correlation = jar.get(cookies::CORRELATION_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(cookies::clear_correlation_cookie());

    match complete_sign_in(&state, &query, correlation.as_deref()).await {
        Ok((cookie, location)) => (jar.add(cookie), found(&location)).into_response(),
        Err(location) => (jar, found(location)).into_response(),
    }
}

/// Runs the callback, yielding the sign-in cookie and where to go next.
/// Errors are the sign-in page redirect to send the browser to.
async fn complete_sign_in(
    state: &AppState,
    query: &CallbackQuery,
    correlation: Option<&str>,
) -> Result<(Cookie<'static>, String), &'static str> {
    if let Some(error) = &query.error {
        tracing::info!("Google sign-in declined: {}", error);
        return Err(EXTERNAL_LOGIN_FAILURE);
    }

    let (info, return_url) = external_login_info(state, query, correlation)
        .await
        .ok_or(EXTERNAL_LOGIN_FAILURE)?;

    let user = match state
        .users
        .find_by_login(&info.login_provider, &info.provider_key)
        .await
        .map_err(|e| log_failure("find login", e))?
    {
        Some(user) => sign_in_existing(state, user, &info).await?,
        None => create_from_login(state, &info).await?,
    };

    let cookie = session::sign_in_cookie(state, &user, true)
        .await
        .map_err(|e| log_failure("issue cookie", e))?;

    tracing::info!("User {} signed in with {}", user.id, info.login_provider);
    Ok((cookie, return_url))
}

/// Checks the correlation cookie against `state`, then trades the code with the provider
async fn external_login_info(
    state: &AppState,
    query: &CallbackQuery,
    correlation: Option<&str>,
) -> Option<(ExternalLoginInfo, String)> {
    let provider = state.google.as_deref()?;
    let (code, oauth_state) = (query.code.as_deref()?, query.state.as_deref()?);

    let claims = match state.tokens.validate(correlation?, TokenPurpose::Correlation) {
        Ok(claims) if claims.sub == oauth_state => claims,
        Ok(_) => {
            tracing::warn!("Google callback state does not match the correlation cookie");
            return None;
        }
        Err(e) => {
            tracing::warn!("Google callback correlation rejected: {}", e);
            return None;
        }
    };

    match provider.exchange_code(code, &callback_uri(state)).await {
        Ok(info) => Some((info, local_return_url(claims.data.as_deref()))),
        Err(e) => {
            tracing::warn!("Google code exchange failed: {}", e);
            None
        }
    }
}

async fn sign_in_existing(state: &AppState, mut user: User, info: &ExternalLoginInfo) -> Result<User, &'static str> {
    if user.is_locked_out(chrono::Utc::now()) {
        tracing::info!("External sign-in refused for locked out user {}", user.id);
        return Err(EXTERNAL_LOGIN_FAILURE);
    }

    state
        .users
        .update_external_tokens(&user, info)
        .await
        .map_err(|e| log_failure("store provider tokens", e))?;
    state
        .users
        .mark_external_login(&mut user, AuthProvider::Google, &info.provider_key)
        .await
        .map_err(|e| log_failure("record external login", e))?;

    Ok(user)
}

async fn create_from_login(state: &AppState, info: &ExternalLoginInfo) -> Result<User, &'static str> {
    let Some(email) = info.email.as_deref().filter(|e| !e.is_empty()) else {
        return Err(NO_EMAIL_FROM_PROVIDER);
    };

    let user = match state
        .users
        .create_external(email, AuthProvider::Google, &info.provider_key)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::info!("Could not create user for {} sign-in: {}", info.login_provider, e);
            return Err(USER_CREATION_FAILED);
        }
    };

    if let Err(e) = state.users.add_login(&user, info).await {
        tracing::info!("Could not link {} login to {}: {}", info.login_provider, user.id, e);
        return Err(ADD_EXTERNAL_LOGIN_FAILED);
    }
    state
        .users
        .update_external_tokens(&user, info)
        .await
        .map_err(|e| log_failure("store provider tokens", e))?;

    Ok(user)
}

fn log_failure(step: &str, e: impl std::fmt::Display) -> &'static str {
    tracing::error!("Google sign-in failed to {}: {}", step, e);
    EXTERNAL_LOGIN_FAILURE
}
