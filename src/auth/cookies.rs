use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::SecurityConfig;

/// Name of the sign-in cookie
pub const APPLICATION_COOKIE: &str = ".AspNetCore.Identity.Application";

/// Short-lived cookie tying an external sign-in callback to the browser that started it
pub const CORRELATION_COOKIE: &str = ".AspNetCore.Correlation.Google";

pub const CORRELATION_LIFETIME_SECS: i64 = 5 * 60;

/// Sign-in cookie. Persistent cookies carry Max-Age; session cookies die with the browser.
pub fn application_cookie(value: String, security: &SecurityConfig, persistent: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((APPLICATION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Strict);

    if persistent {
        builder = builder.max_age(time::Duration::days(security.cookie_expiry_days));
    }

    builder.build()
}

pub fn clear_application_cookie() -> Cookie<'static> {
    Cookie::build(APPLICATION_COOKIE).path("/").build()
}

/// Lax so the browser sends it back on the provider's top-level redirect
pub fn correlation_cookie(value: String, security: &SecurityConfig) -> Cookie<'static> {
    Cookie::build((CORRELATION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(CORRELATION_LIFETIME_SECS))
        .build()
}

pub fn clear_correlation_cookie() -> Cookie<'static> {
    Cookie::build(CORRELATION_COOKIE).path("/").build()
}
