// handlers/public/users/logout.rs - POST /api/Users/logout

use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::cookies;
use crate::middleware::ApiResponse;

pub async fn logout_post(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(cookies::clear_application_cookie()), ApiResponse::ok())
}
