// handlers/public/index.rs - GET / and GET /api

use axum::{response::Json, response::Response};
use serde_json::{json, Value};

use crate::handlers::found;

pub async fn root_get() -> Response {
    found("/api")
}

pub async fn api_get() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "ArchiteX API",
        "version": version,
        "endpoints": {
            "health": "/health (public)",
            "users": "/api/Users/register, /login, /refresh, /confirmEmail, /resendConfirmationEmail, /forgotPassword, /resetPassword, /logout (public)",
            "external": "/api/Users/sign-in/google[/callback] (public)",
            "manage": "/api/Users/manage/info, /api/Users/manage/2fa (authenticated)",
            "todoLists": "/api/TodoLists[/:id] (authenticated)",
            "todoItems": "/api/TodoItems[/:id], /api/TodoItems/UpdateDetail/:id (authenticated)",
            "weatherForecasts": "/api/WeatherForecasts (administrators)",
        }
    }))
}
