// handlers/protected/weather_forecasts.rs - GET /api/WeatherForecasts

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::application::weather_forecasts::{GetWeatherForecasts, WeatherForecast};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

pub async fn weather_forecasts_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<WeatherForecast>> {
    let forecasts = state.sender(Some(&user)).send(GetWeatherForecasts).await?;
    Ok(ApiResponse::success(forecasts))
}
