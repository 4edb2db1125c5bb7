use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::AuthProvider;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub security_stamp: String,
    pub two_factor_enabled: bool,
    #[serde(skip_serializing)]
    pub authenticator_key: Option<String>,
    #[serde(skip_serializing)]
    pub recovery_codes: Option<String>,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i64,
    pub external_login_provider: Option<i64>,
    pub external_login_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn external_provider(&self) -> Option<AuthProvider> {
        self.external_login_provider.and_then(AuthProvider::from_i64)
    }

    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_enabled && self.lockout_end.is_some_and(|end| end > now)
    }

    /// Hashed recovery codes still available for two-factor sign-in.
    pub fn recovery_code_hashes(&self) -> Vec<&str> {
        self.recovery_codes
            .as_deref()
            .map(|codes| codes.split(';').filter(|c| !c.is_empty()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserLogin {
    pub login_provider: String,
    pub provider_key: String,
    pub provider_display_name: Option<String>,
    pub user_id: String,
}
