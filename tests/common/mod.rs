#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use architex_api::app::{app, AppState};
use architex_api::config::AppConfig;
use architex_api::database::models::User;
use architex_api::database::{seed, DatabaseManager};
use architex_api::identity::EmailSender;
use architex_api::pipeline::{DomainEvent, DomainEventHandler};

pub const PASSWORD: &str = "Passw0rd!";

/// A mail the API tried to send
#[derive(Debug, Clone)]
pub enum SentEmail {
    ConfirmationLink { to: String, link: String },
    PasswordResetCode { to: String, code: String },
}

/// Keeps outbound mail in memory so tests can follow links and codes
#[derive(Default)]
pub struct CapturingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl CapturingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_confirmation_link(&self, to: &str) -> Option<String> {
        self.sent().into_iter().rev().find_map(|mail| match mail {
            SentEmail::ConfirmationLink { to: addr, link } if addr == to => Some(link),
            _ => None,
        })
    }

    pub fn last_reset_code(&self, to: &str) -> Option<String> {
        self.sent().into_iter().rev().find_map(|mail| match mail {
            SentEmail::PasswordResetCode { to: addr, code } if addr == to => Some(code),
            _ => None,
        })
    }
}

#[async_trait]
impl EmailSender for CapturingEmailSender {
    async fn send_confirmation_link(&self, _user: &User, email: &str, confirmation_link: &str) {
        self.sent.lock().unwrap().push(SentEmail::ConfirmationLink {
            to: email.to_string(),
            link: confirmation_link.to_string(),
        });
    }

    async fn send_password_reset_code(&self, _user: &User, email: &str, reset_code: &str) {
        self.sent.lock().unwrap().push(SentEmail::PasswordResetCode {
            to: email.to_string(),
            code: reset_code.to_string(),
        });
    }
}

/// Records every dispatched domain event
#[derive(Default)]
pub struct CapturingEventHandler {
    events: Mutex<Vec<DomainEvent>>,
}

impl CapturingEventHandler {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl DomainEventHandler for CapturingEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub emails: Arc<CapturingEmailSender>,
    pub events: Arc<CapturingEventHandler>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).with_context(|| format!("body was not JSON: {}", self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the first Set-Cookie header for `name`
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", name)))
            .map(|v| v.split(';').next().unwrap_or_default().to_string())
    }

    pub fn raw_set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", name)))
            .map(str::to_string)
    }
}

/// Credentials attached to a test request
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
}

pub fn test_config() -> AppConfig {
    AppConfig::testing()
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        Self::spawn_with_state(config, |state| state).await
    }

    /// Build the app on a fresh in-memory database; `customise` can swap collaborators
    pub async fn spawn_with_state(config: AppConfig, customise: impl FnOnce(AppState) -> AppState) -> Result<Self> {
        let db = DatabaseManager::connect(&config.database).await?;
        db.migrate().await?;

        let emails = Arc::new(CapturingEmailSender::default());
        let events = Arc::new(CapturingEventHandler::default());

        let state = AppState::new(Arc::new(config), db)?
            .with_email_sender(emails.clone())
            .with_event_handler(events.clone());
        let state = customise(state);

        Ok(Self {
            router: app(state.clone()),
            state,
            emails,
            events,
        })
    }

    pub async fn request(&self, method: Method, uri: &str, auth: Auth<'_>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        builder = match auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            Auth::Cookie(cookie) => builder.header(header::COOKIE, cookie),
        };

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send(request).await
    }

    /// GET carrying raw headers, for credentials the `Auth` shortcuts don't express
    pub async fn get_with_headers(&self, uri: &str, headers: &[(header::HeaderName, &str)]) -> Result<TestResponse> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        self.send(builder.body(Body::empty())?).await
    }

    async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await?.to_vec();

        Ok(TestResponse { status, headers, body })
    }

    pub async fn get(&self, uri: &str, auth: Auth<'_>) -> Result<TestResponse> {
        self.request(Method::GET, uri, auth, None).await
    }

    pub async fn post(&self, uri: &str, auth: Auth<'_>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, auth, Some(body)).await
    }

    pub async fn put(&self, uri: &str, auth: Auth<'_>, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, auth, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, auth: Auth<'_>) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, auth, None).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<TestResponse> {
        self.post(
            "/api/Users/register",
            Auth::None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Bearer sign-in; returns the access token response body
    pub async fn login(&self, email: &str, password: &str) -> Result<Value> {
        let response = self
            .post(
                "/api/Users/login",
                Auth::None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        anyhow::ensure!(response.status == StatusCode::OK, "login failed: {} {}", response.status, response.text());
        response.json()
    }

    /// Register and sign in a fresh user; returns the access token
    pub async fn signed_in_user(&self, email: &str) -> Result<String> {
        let registered = self.register(email, PASSWORD).await?;
        anyhow::ensure!(registered.status == StatusCode::OK, "register failed: {}", registered.text());
        let tokens = self.login(email, PASSWORD).await?;
        Ok(tokens["accessToken"].as_str().context("no access token")?.to_string())
    }

    /// Seed the administrator account and sign it in; returns the access token
    pub async fn signed_in_administrator(&self) -> Result<String> {
        seed::seed(&self.state.db, &self.state.users).await?;
        let tokens = self.login(seed::ADMINISTRATOR_EMAIL, seed::ADMINISTRATOR_PASSWORD).await?;
        Ok(tokens["accessToken"].as_str().context("no access token")?.to_string())
    }

    /// Path and query of the last confirmation link mailed to `email`
    pub fn confirmation_path(&self, email: &str) -> Result<String> {
        let link = self
            .emails
            .last_confirmation_link(email)
            .with_context(|| format!("no confirmation mail for {}", email))?;
        let url = Url::parse(&link)?;
        Ok(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
    }
}

/// Query parameters of a URL or path
pub fn query_params(location: &str) -> Result<HashMap<String, String>> {
    let url = Url::parse("http://localhost")?.join(location)?;
    Ok(url.query_pairs().into_owned().collect())
}
