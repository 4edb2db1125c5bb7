use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::app::AppState;
use crate::auth::{cookies, session, Claims, TokenPurpose};
use crate::error::ApiError;

/// Cookies older than this have their security stamp checked against the store
const STAMP_VALIDATION_INTERVAL_SECS: i64 = 30 * 60;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    Cookie,
}

/// Authenticated user context, inserted as a request extension
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub stamp: String,
    pub scheme: AuthScheme,
}

impl AuthUser {
    fn from_claims(claims: Claims, scheme: AuthScheme) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            stamp: claims.stamp,
            scheme,
        }
    }
}

/// Resolve the current user from a bearer token, or failing that the application cookie.
/// Never rejects; endpoints that need a user sit behind `require_auth`.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut renewed: Option<Cookie<'static>> = None;
    let mut cleared = false;

    if let Some(token) = bearer_token(request.headers()) {
        match state.tokens.validate(token, TokenPurpose::Access) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(AuthUser::from_claims(claims, AuthScheme::Bearer));
            }
            Err(e) => tracing::debug!("Bearer token rejected: {}", e),
        }
    } else if let Some(cookie) = jar.get(cookies::APPLICATION_COOKIE) {
        match state.tokens.validate(cookie.value(), TokenPurpose::Cookie) {
            Ok(claims) => match refresh_cookie_principal(&state, claims).await {
                Some((user, cookie)) => {
                    renewed = cookie;
                    request.extensions_mut().insert(user);
                }
                None => cleared = true,
            },
            Err(e) => {
                tracing::debug!("Application cookie rejected: {}", e);
                cleared = true;
            }
        }
    }

    let response = next.run(request).await;

    if let Some(cookie) = renewed {
        (jar.add(cookie), response).into_response()
    } else if cleared {
        (jar.remove(cookies::clear_application_cookie()), response).into_response()
    } else {
        response
    }
}

/// Validate an older cookie against the user's current security stamp and
/// re-issue it once past half its lifetime. `None` means the cookie is dead.
async fn refresh_cookie_principal(
    state: &AppState,
    claims: Claims,
) -> Option<(AuthUser, Option<Cookie<'static>>)> {
    let security = &state.config.security;
    let needs_renewal = security.sliding_expiration && claims.age() > claims.lifetime() / 2;

    if !needs_renewal && claims.age() < STAMP_VALIDATION_INTERVAL_SECS {
        return Some((AuthUser::from_claims(claims, AuthScheme::Cookie), None));
    }

    let user = match state.users.find_by_id(&claims.sub).await {
        Ok(Some(user)) if user.security_stamp == claims.stamp => user,
        Ok(_) => {
            tracing::debug!("Security stamp validation failed for cookie of user {}", claims.sub);
            return None;
        }
        Err(e) => {
            tracing::error!("Could not validate cookie principal {}: {}", claims.sub, e);
            return Some((AuthUser::from_claims(claims, AuthScheme::Cookie), None));
        }
    };

    if !needs_renewal {
        return Some((AuthUser::from_claims(claims, AuthScheme::Cookie), None));
    }

    match session::sign_in_cookie(state, &user, claims.persistent).await {
        Ok(cookie) => {
            tracing::debug!("Renewed application cookie for user {}", user.id);
            let principal = state
                .tokens
                .validate(cookie.value(), TokenPurpose::Cookie)
                .map(|fresh| AuthUser::from_claims(fresh, AuthScheme::Cookie))
                .unwrap_or_else(|_| AuthUser::from_claims(claims, AuthScheme::Cookie));
            Some((principal, Some(cookie)))
        }
        Err(e) => {
            tracing::error!("Could not renew application cookie: {}", e);
            Some((AuthUser::from_claims(claims, AuthScheme::Cookie), None))
        }
    }
}

/// Reject requests that `authenticate` could not attach a user to
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<AuthUser>().is_none() {
        return Err(ApiError::unauthorized());
    }
    Ok(next.run(request).await)
}

/// `Some` whenever the header selects the bearer scheme, even with a blank token
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let scheme = value.get(..BEARER_PREFIX.len())?;
    scheme
        .eq_ignore_ascii_case(BEARER_PREFIX)
        .then(|| value[BEARER_PREFIX.len()..].trim())
}
