// handlers/mod.rs - Tiered handler architecture
//
// Public (no auth) → Protected (cookie or bearer auth)
// Role and policy checks live in the request pipeline, not in a route tier.

pub mod protected; // Tier 2: authenticated user required
pub mod public; // Tier 1: no authentication required

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// 302 Found, the redirect browsers and OAuth providers expect
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
