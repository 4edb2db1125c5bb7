use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

const DEVELOPMENT_TOKEN_SECRET: &str = "architex-development-secret-change-me";
const TESTING_HASH_MEMORY_KIB: u32 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub authentication: AuthenticationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub auto_migrate: bool,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub public_base_url: String,
    pub enable_request_logging: bool,
    pub slow_request_threshold_ms: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allow_any_origin: bool,
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    pub token_secret: Option<String>,
    pub bearer_expiry_secs: i64,
    pub refresh_expiry_days: i64,
    pub cookie_expiry_days: i64,
    pub sliding_expiration: bool,
    pub cookie_secure: bool,
    pub require_confirmed_email: bool,
    pub lockout_max_failed_attempts: i64,
    pub lockout_minutes: i64,
    /// Argon2id work factors
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_information_endpoint: String,
}

/// Google client credentials, present only when both halves are configured.
#[derive(Debug, Clone)]
pub struct GoogleCredentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub settings: &'a GoogleConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }
        if let Ok(v) = env::var("DATABASE_SEED_DEMO_DATA") {
            self.database.seed_demo_data = v.parse().unwrap_or(self.database.seed_demo_data);
        }

        // API overrides
        if let Some(port) = env::var("ARCHITEX_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_PUBLIC_BASE_URL") {
            self.api.public_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_SLOW_REQUEST_THRESHOLD_MS") {
            self.api.slow_request_threshold_ms = v.parse().unwrap_or(self.api.slow_request_threshold_ms);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ALLOW_ANY_ORIGIN") {
            self.security.allow_any_origin = v.parse().unwrap_or(self.security.allow_any_origin);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_SECRET") {
            self.security.token_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SECURITY_BEARER_EXPIRY_SECS") {
            self.security.bearer_expiry_secs = v.parse().unwrap_or(self.security.bearer_expiry_secs);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_EXPIRY_DAYS") {
            self.security.refresh_expiry_days = v.parse().unwrap_or(self.security.refresh_expiry_days);
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_EXPIRY_DAYS") {
            self.security.cookie_expiry_days = v.parse().unwrap_or(self.security.cookie_expiry_days);
        }
        if let Ok(v) = env::var("SECURITY_SLIDING_EXPIRATION") {
            self.security.sliding_expiration = v.parse().unwrap_or(self.security.sliding_expiration);
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_CONFIRMED_EMAIL") {
            self.security.require_confirmed_email = v.parse().unwrap_or(self.security.require_confirmed_email);
        }

        // External providers
        if let Ok(v) = env::var("AUTHENTICATION_GOOGLE_CLIENT_ID") {
            self.authentication.google.client_id = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("AUTHENTICATION_GOOGLE_CLIENT_SECRET") {
            self.authentication.google.client_secret = Some(v).filter(|s| !s.is_empty());
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "sqlite://architex.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
                auto_migrate: true,
                seed_demo_data: true,
            },
            api: ApiConfig {
                port: 5142,
                public_base_url: "http://localhost:5142".to_string(),
                enable_request_logging: true,
                slow_request_threshold_ms: 500,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                allow_any_origin: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
                require_https: false,
                token_secret: None,
                bearer_expiry_secs: 3600,
                refresh_expiry_days: 14,
                cookie_expiry_days: 7,
                sliding_expiration: true,
                cookie_secure: true,
                require_confirmed_email: false,
                lockout_max_failed_attempts: 5,
                lockout_minutes: 5,
                password_hash_memory_kib: argon2::Params::DEFAULT_M_COST,
                password_hash_iterations: argon2::Params::DEFAULT_T_COST,
            },
            authentication: AuthenticationConfig::default(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.seed_demo_data = false;
        config.database.max_connections = 10;
        config.api.public_base_url = "https://staging-api.architex.dev".to_string();
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.allow_any_origin = false;
        config.security.cors_origins = vec!["https://staging.architex.dev".to_string()];
        config.security.require_https = true;
        config
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: "sqlite://architex.db?mode=rwc".to_string(),
                max_connections: 20,
                connection_timeout: 5,
                auto_migrate: false,
                seed_demo_data: false,
            },
            api: ApiConfig {
                port: 8080,
                public_base_url: "https://api.architex.dev".to_string(),
                enable_request_logging: false,
                slow_request_threshold_ms: 500,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                allow_any_origin: false,
                cors_origins: vec!["https://architex.dev".to_string()],
                require_https: true,
                token_secret: None,
                bearer_expiry_secs: 3600,
                refresh_expiry_days: 14,
                cookie_expiry_days: 7,
                sliding_expiration: true,
                cookie_secure: true,
                require_confirmed_email: false,
                lockout_max_failed_attempts: 5,
                lockout_minutes: 5,
                password_hash_memory_kib: argon2::Params::DEFAULT_M_COST,
                password_hash_iterations: argon2::Params::DEFAULT_T_COST,
            },
            authentication: AuthenticationConfig::default(),
        }
    }

    /// In-memory database, no seeding, fixed secret. Used by the test suites.
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        config.database.seed_demo_data = false;
        config.api.enable_request_logging = false;
        config.security.token_secret = Some("architex-test-secret".to_string());
        config.security.password_hash_memory_kib = TESTING_HASH_MEMORY_KIB;
        config.security.password_hash_iterations = 1;
        config
    }

    /// Secret used to sign every token and cookie the API issues.
    pub fn token_secret(&self) -> anyhow::Result<String> {
        match (&self.security.token_secret, self.environment) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, Environment::Development) => Ok(DEVELOPMENT_TOKEN_SECRET.to_string()),
            (None, env) => anyhow::bail!("SECURITY_TOKEN_SECRET must be set in {:?}", env),
        }
    }

    pub fn google(&self) -> Option<GoogleCredentials<'_>> {
        let google = &self.authentication.google;
        match (google.client_id.as_deref(), google.client_secret.as_deref()) {
            (Some(client_id), Some(client_secret)) => Some(GoogleCredentials {
                client_id,
                client_secret,
                settings: google,
            }),
            _ => None,
        }
    }
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            google: GoogleConfig {
                client_id: None,
                client_secret: None,
                authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
                user_information_endpoint: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
