pub mod cookies;
pub mod external;
pub mod session;
pub mod totp;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// What a signed token may be used for. A token is only accepted for the purpose it was minted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    Cookie,
    Correlation,
    ConfirmEmail,
    ChangeEmail,
    ResetPassword,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, or the OAuth state for correlation tokens
    pub sub: String,
    pub purpose: TokenPurpose,
    /// Security stamp of the user when the token was issued
    #[serde(default)]
    pub stamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Purpose-specific payload: the new address for ChangeEmail, the return url for Correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default)]
    pub persistent: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, purpose: TokenPurpose, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            purpose,
            stamp: String::new(),
            name: None,
            email: None,
            roles: Vec::new(),
            data: None,
            persistent: false,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn with_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.stamp = stamp.into();
        self
    }

    pub fn with_identity(mut self, name: Option<String>, email: Option<String>, roles: Vec<String>) -> Self {
        self.name = name;
        self.email = email;
        self.roles = roles;
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn lifetime(&self) -> i64 {
        self.exp - self.iat
    }

    /// Seconds since issue, clamped at zero
    pub fn age(&self) -> i64 {
        (Utc::now().timestamp() - self.iat).max(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token generation error: {0}")]
    Generation(String),
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token expired")]
    Expired,
    #[error("token issued for {actual:?}, expected {expected:?}")]
    WrongPurpose { expected: TokenPurpose, actual: TokenPurpose },
}

/// Signs and validates every token the API hands out (HS256)
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Decode, verify signature and expiry, and check the purpose
    pub fn validate(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?
            .claims;

        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose { expected: purpose, actual: claims.purpose });
        }

        Ok(claims)
    }
}
