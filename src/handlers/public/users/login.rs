// handlers/public/users/login.rs - POST /api/Users/login?useCookies&useSessionCookies

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::session;
use crate::error::ApiError;
use crate::identity::{SignInResult, TwoFactorInput};
use crate::middleware::ApiResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub two_factor_code: Option<String>,
    #[serde(default)]
    pub two_factor_recovery_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOptions {
    pub use_cookies: Option<bool>,
    pub use_session_cookies: Option<bool>,
}

/// Password sign-in. Answers with a bearer token pair, or with the
/// application cookie when either cookie option is set.
pub async fn login_post(
    State(state): State<AppState>,
    Query(options): Query<LoginOptions>,
    jar: CookieJar,
    Json(login): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let use_cookies = options.use_cookies == Some(true);
    let use_session_cookies = options.use_session_cookies == Some(true);
    let use_cookie_scheme = use_cookies || use_session_cookies;
    let persistent = use_cookies && !use_session_cookies;

    let two_factor = TwoFactorInput {
        code: login.two_factor_code.as_deref().filter(|c| !c.is_empty()),
        recovery_code: login.two_factor_recovery_code.as_deref().filter(|c| !c.is_empty()),
    };

    let user = match state.users.password_sign_in(&login.email, &login.password, two_factor).await? {
        SignInResult::Succeeded(user) => user,
        failed => {
            tracing::info!("Login failed for '{}': {}", login.email, failed.detail());
            return Err(ApiError::unauthorized_with(failed.detail()));
        }
    };

    tracing::info!("User {} signed in ({})", user.id, if use_cookie_scheme { "cookie" } else { "bearer" });

    if use_cookie_scheme {
        let cookie = session::sign_in_cookie(&state, &user, persistent).await?;
        return Ok((jar.add(cookie), ApiResponse::ok()).into_response());
    }

    let tokens = session::bearer_tokens(&state, &user).await?;
    Ok(ApiResponse::success(tokens).into_response())
}
