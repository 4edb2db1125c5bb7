mod common;

use std::sync::Arc;

use anyhow::Result;
use architex_api::auth::external::{ExternalAuthError, ExternalAuthProvider, ExternalLoginInfo};
use async_trait::async_trait;
use axum::http::StatusCode;
use common::{query_params, Auth, TestApp, TestResponse};

const CORRELATION: &str = ".AspNetCore.Correlation.Google";
const COOKIE: &str = ".AspNetCore.Identity.Application";

/// Stands in for Google: every code belongs to the same account
struct FakeGoogle {
    subject: &'static str,
    email: Option<&'static str>,
}

#[async_trait]
impl ExternalAuthProvider for FakeGoogle {
    fn scheme(&self) -> &'static str {
        "Google"
    }

    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        format!("https://accounts.test/auth?state={}&redirect_uri={}", state, redirect_uri)
    }

    async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<ExternalLoginInfo, ExternalAuthError> {
        if code != "good-code" {
            return Err(ExternalAuthError::Rejected("bad code".into()));
        }
        Ok(ExternalLoginInfo {
            login_provider: "Google".into(),
            provider_key: self.subject.into(),
            email: self.email.map(str::to_string),
            tokens: vec![("access_token".into(), "google-access".into())],
            ..Default::default()
        })
    }
}

async fn app_with_google(email: Option<&'static str>) -> Result<TestApp> {
    TestApp::spawn_with_state(common::test_config(), |state| {
        state.with_external_provider(Arc::new(FakeGoogle { subject: "google-sub-1", email }))
    })
    .await
}

/// Run the challenge and return (state, correlation cookie)
async fn challenge(app: &TestApp, callback_url: &str) -> Result<(String, String)> {
    let res = app
        .get(&format!("/api/Users/sign-in/google?callbackUrl={}", callback_url), Auth::None)
        .await?;
    assert_eq!(res.status, StatusCode::FOUND);

    let location = res.location().unwrap_or_default().to_string();
    let state = query_params(&location)?.remove("state").unwrap_or_default();
    let cookie = res.set_cookie(CORRELATION).expect("correlation cookie");
    Ok((state, cookie))
}

async fn callback(app: &TestApp, code: &str, state: &str, cookie: &str) -> Result<TestResponse> {
    app.get(
        &format!("/api/Users/sign-in/google/callback?code={}&state={}", code, state),
        Auth::Cookie(cookie),
    )
    .await
}

#[tokio::test]
async fn unconfigured_provider_is_a_bad_request() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get("/api/Users/sign-in/google", Auth::None).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["detail"], "External provider 'Google' is not configured");
    Ok(())
}

#[tokio::test]
async fn challenge_redirects_with_state_and_callback() -> Result<()> {
    let app = app_with_google(Some("sam@gmail.test")).await?;

    let res = app.get("/api/Users/sign-in/google", Auth::None).await?;
    let location = res.location().unwrap_or_default().to_string();
    let params = query_params(&location)?;

    assert!(location.starts_with("https://accounts.test/auth"));
    assert!(!params["state"].is_empty());
    assert_eq!(params["redirect_uri"], "http://localhost:5142/api/Users/sign-in/google/callback");
    Ok(())
}

#[tokio::test]
async fn first_callback_creates_a_confirmed_user_and_signs_in() -> Result<()> {
    let app = app_with_google(Some("sam@gmail.test")).await?;
    let (state, cookie) = challenge(&app, "/todos").await?;

    let res = callback(&app, "good-code", &state, &cookie).await?;

    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location(), Some("/todos"));
    let session = res.set_cookie(COOKIE).expect("sign-in cookie");

    let info = app.get("/api/Users/manage/info", Auth::Cookie(&session)).await?.json()?;
    assert_eq!(info["email"], "sam@gmail.test");
    assert_eq!(info["isEmailConfirmed"], true);

    let user = app.state.users.find_by_login("Google", "google-sub-1").await?.expect("linked user");
    assert_eq!(user.external_login_id.as_deref(), Some("google-sub-1"));
    assert!(user.password_hash.is_none());
    assert_eq!(app.state.users.logins(&user).await?.len(), 1);
    assert_eq!(
        app.state.users.external_token(&user, "Google", "access_token").await?.as_deref(),
        Some("google-access")
    );
    Ok(())
}

#[tokio::test]
async fn returning_user_signs_in_with_the_existing_account() -> Result<()> {
    let app = app_with_google(Some("sam@gmail.test")).await?;

    let (state, cookie) = challenge(&app, "/").await?;
    callback(&app, "good-code", &state, &cookie).await?;
    let (state, cookie) = challenge(&app, "/").await?;
    let res = callback(&app, "good-code", &state, &cookie).await?;

    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location(), Some("/"));
    assert!(res.set_cookie(COOKIE).is_some());
    assert_eq!(app.state.users.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn callback_failures_redirect_to_sign_in() -> Result<()> {
    let app = app_with_google(Some("sam@gmail.test")).await?;
    let (state, cookie) = challenge(&app, "/").await?;

    let wrong_state = callback(&app, "good-code", "forged", &cookie).await?;
    assert_eq!(wrong_state.location(), Some("/sign-in?error=External_login_failure"));

    let bad_code = callback(&app, "bad-code", &state, &cookie).await?;
    assert_eq!(bad_code.location(), Some("/sign-in?error=External_login_failure"));

    let no_cookie = app
        .get(
            &format!("/api/Users/sign-in/google/callback?code=good-code&state={}", state),
            Auth::None,
        )
        .await?;
    assert_eq!(no_cookie.location(), Some("/sign-in?error=External_login_failure"));
    Ok(())
}

#[tokio::test]
async fn provider_without_email_cannot_create_an_account() -> Result<()> {
    let app = app_with_google(None).await?;
    let (state, cookie) = challenge(&app, "/").await?;

    let res = callback(&app, "good-code", &state, &cookie).await?;

    assert_eq!(res.location(), Some("/sign-in?error=No_email_from_provider"));
    Ok(())
}

#[tokio::test]
async fn email_already_registered_locally_fails_user_creation() -> Result<()> {
    let app = app_with_google(Some("taken@example.com")).await?;
    app.register("taken@example.com", common::PASSWORD).await?;
    let (state, cookie) = challenge(&app, "/").await?;

    let res = callback(&app, "good-code", &state, &cookie).await?;

    assert_eq!(res.location(), Some("/sign-in?error=User_creation_failed"));
    Ok(())
}

#[tokio::test]
async fn external_return_urls_fall_back_to_root() -> Result<()> {
    let app = app_with_google(Some("uma@gmail.test")).await?;
    let (state, cookie) = challenge(&app, "https://evil.test/").await?;

    let res = callback(&app, "good-code", &state, &cookie).await?;

    assert_eq!(res.location(), Some("/"));
    Ok(())
}
