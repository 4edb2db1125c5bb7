use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use url::Url;

use crate::config::GoogleCredentials;

#[derive(Debug, thiserror::Error)]
pub enum ExternalAuthError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider rejected the exchange: {0}")]
    Rejected(String),
}

/// What an external provider told us about the person signing in
#[derive(Debug, Clone, Default)]
pub struct ExternalLoginInfo {
    pub login_provider: String,
    pub provider_key: String,
    pub email: Option<String>,
    /// Tokens to persist against the user (access_token, refresh_token, expires_at, ...)
    pub tokens: Vec<(String, String)>,
}

/// An OAuth 2.0 authorization-code provider
#[async_trait]
pub trait ExternalAuthProvider: Send + Sync {
    /// Scheme name, also used as the login provider key
    fn scheme(&self) -> &'static str;

    /// Where to send the browser to start the challenge
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Trade the callback code for tokens and the user's profile
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ExternalLoginInfo, ExternalAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorization_endpoint: String,
    token_endpoint: String,
    user_information_endpoint: String,
}

impl GoogleProvider {
    pub const SCOPES: [&'static str; 3] = ["openid", "profile", "email"];

    pub fn new(credentials: GoogleCredentials<'_>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: credentials.client_id.to_string(),
            client_secret: credentials.client_secret.to_string(),
            authorization_endpoint: credentials.settings.authorization_endpoint.clone(),
            token_endpoint: credentials.settings.token_endpoint.clone(),
            user_information_endpoint: credentials.settings.user_information_endpoint.clone(),
        }
    }
}

#[async_trait]
impl ExternalAuthProvider for GoogleProvider {
    fn scheme(&self) -> &'static str {
        "Google"
    }

    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        let scope = Self::SCOPES.join(" ");
        match Url::parse_with_params(
            &self.authorization_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        ) {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::error!("Invalid Google authorization endpoint '{}': {}", self.authorization_endpoint, e);
                self.authorization_endpoint.clone()
            }
        }
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ExternalLoginInfo, ExternalAuthError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalAuthError::Rejected(format!("token endpoint returned {}: {}", status, body)));
        }
        let tokens: TokenResponse = response.json().await?;

        let user: GoogleUser = self
            .http
            .get(&self.user_information_endpoint)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut saved = vec![("access_token".to_string(), tokens.access_token.clone())];
        if let Some(refresh) = tokens.refresh_token {
            saved.push(("refresh_token".to_string(), refresh));
        }
        if let Some(token_type) = tokens.token_type {
            saved.push(("token_type".to_string(), token_type));
        }
        if let Some(expires_in) = tokens.expires_in {
            let expires_at = Utc::now() + Duration::seconds(expires_in);
            saved.push(("expires_at".to_string(), expires_at.to_rfc3339()));
        }

        Ok(ExternalLoginInfo {
            login_provider: self.scheme().to_string(),
            provider_key: user.sub,
            email: user.email,
            tokens: saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn authorization_url_carries_client_state_and_scopes() {
        let mut config = AppConfig::testing();
        config.authentication.google.client_id = Some("client-123".into());
        config.authentication.google.client_secret = Some("secret".into());
        let provider = GoogleProvider::new(config.google().unwrap());

        let url = Url::parse(&provider.authorization_url("xyz", "http://localhost/cb")).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["redirect_uri"], "http://localhost/cb");
        assert_eq!(params["scope"], "openid profile email");
        assert_eq!(params["response_type"], "code");
    }
}
