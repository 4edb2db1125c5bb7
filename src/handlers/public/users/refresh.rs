// handlers/public/users/refresh.rs - POST /api/Users/refresh

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::session::{self, AccessTokenResponse};
use crate::auth::TokenPurpose;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Trade a refresh token for a new pair. Dies with the user's security stamp.
pub async fn refresh_post(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<AccessTokenResponse> {
    let claims = state.tokens.validate(&request.refresh_token, TokenPurpose::Refresh)?;

    let user = match state.users.find_by_id(&claims.sub).await? {
        Some(user) if user.security_stamp == claims.stamp => user,
        _ => {
            tracing::debug!("Refresh rejected for {}: user missing or stamp changed", claims.sub);
            return Err(ApiError::unauthorized());
        }
    };

    Ok(ApiResponse::success(session::bearer_tokens(&state, &user).await?))
}
