use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::pipeline::{Authorize, PipelineError, Request, RequestContext};
use crate::types::Role;

const SUMMARIES: [&str; 10] = [
    "Freezing", "Bracing", "Chilly", "Cool", "Mild", "Warm", "Balmy", "Hot", "Sweltering", "Scorching",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: DateTime<Utc>,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
}

impl WeatherForecast {
    pub fn new(date: DateTime<Utc>, temperature_c: i32, summary: &str) -> Self {
        Self {
            date,
            temperature_c,
            temperature_f: 32 + (temperature_c as f64 / 0.5556) as i32,
            summary: Some(summary.to_string()),
        }
    }
}

/// Five days of made-up weather, starting tomorrow. Administrators only.
#[derive(Debug, Default)]
pub struct GetWeatherForecasts;

#[async_trait]
impl Request for GetWeatherForecasts {
    type Response = Vec<WeatherForecast>;
    const NAME: &'static str = "GetWeatherForecastsQuery";

    fn authorization(&self) -> &'static [Authorize] {
        const RULES: &[Authorize] = &[Authorize::roles(&[Role::Administrator])];
        RULES
    }

    async fn handle(self, _ctx: &RequestContext) -> Result<Self::Response, PipelineError> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        Ok((1..=5)
            .map(|day| {
                let temperature_c = rng.gen_range(-20..55);
                let summary = SUMMARIES[rng.gen_range(0..SUMMARIES.len())];
                WeatherForecast::new(now + Duration::days(day), temperature_c, summary)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_truncates_toward_zero() {
        let now = Utc::now();
        assert_eq!(WeatherForecast::new(now, 0, "Cool").temperature_f, 32);
        assert_eq!(WeatherForecast::new(now, 20, "Mild").temperature_f, 67);
        assert_eq!(WeatherForecast::new(now, -20, "Freezing").temperature_f, -3);
        assert_eq!(WeatherForecast::new(now, 54, "Scorching").temperature_f, 129);
    }

    #[test]
    fn serializes_with_client_field_names() {
        let forecast = WeatherForecast::new(Utc::now(), 10, "Chilly");
        let value = serde_json::to_value(&forecast).unwrap();
        assert_eq!(value["temperatureC"], 10);
        assert_eq!(value["temperatureF"], 49);
        assert_eq!(value["summary"], "Chilly");
    }
}
