use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::errors::{IdentityError, IdentityErrorDescriber, IdentityErrors};
use super::password::{PasswordHasher, PasswordOptions};
use crate::auth::external::ExternalLoginInfo;
use crate::auth::{totp, Claims, TokenPurpose, TokenService};
use crate::config::SecurityConfig;
use crate::database::models::{User, UserLogin};
use crate::database::{roles, users};
use crate::types::AuthProvider;

const EMAIL_TOKEN_LIFETIME_HOURS: i64 = 24;
const ALLOWED_USER_NAME_CHARACTERS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._@+";

/// Outcome of a password sign-in attempt
#[derive(Debug)]
pub enum SignInResult {
    Succeeded(Box<User>),
    Failed,
    LockedOut,
    RequiresTwoFactor,
    NotAllowed,
}

impl SignInResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, SignInResult::Succeeded(_))
    }

    /// Problem detail reported to the client when sign-in did not succeed
    pub fn detail(&self) -> &'static str {
        match self {
            SignInResult::Succeeded(_) => "Succeeded",
            SignInResult::Failed => "Failed",
            SignInResult::LockedOut => "Lockedout",
            SignInResult::RequiresTwoFactor => "RequiresTwoFactor",
            SignInResult::NotAllowed => "NotAllowed",
        }
    }
}

/// Second factor supplied alongside the password
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoFactorInput<'a> {
    pub code: Option<&'a str>,
    pub recovery_code: Option<&'a str>,
}

/// Users, passwords, lockout, roles, logins and account tokens
#[derive(Clone)]
pub struct UserManager {
    pool: SqlitePool,
    tokens: TokenService,
    hasher: PasswordHasher,
    password_options: PasswordOptions,
    max_failed_access_attempts: i64,
    lockout_duration: Duration,
    require_confirmed_email: bool,
}

impl UserManager {
    pub fn new(pool: SqlitePool, tokens: TokenService, security: &SecurityConfig) -> Self {
        Self {
            pool,
            tokens,
            hasher: PasswordHasher::new(security.password_hash_memory_kib, security.password_hash_iterations),
            password_options: PasswordOptions::default(),
            max_failed_access_attempts: security.lockout_max_failed_attempts,
            lockout_duration: Duration::minutes(security.lockout_minutes),
            require_confirmed_email: security.require_confirmed_email,
        }
    }

    pub fn normalize(value: &str) -> String {
        value.to_uppercase()
    }

    /// One `@` with something on both sides and no whitespace
    pub fn is_valid_email(email: &str) -> bool {
        let mut parts = email.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
            }
            _ => false,
        }
    }

    /// Unsaved user whose user name is their email address
    pub fn new_user(email: &str) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            user_name: email.to_string(),
            normalized_user_name: Self::normalize(email),
            email: Some(email.to_string()),
            normalized_email: Some(Self::normalize(email)),
            email_confirmed: false,
            password_hash: None,
            security_stamp: new_security_stamp(),
            two_factor_enabled: false,
            authenticator_key: None,
            recovery_codes: None,
            lockout_end: None,
            lockout_enabled: true,
            access_failed_count: 0,
            external_login_provider: None,
            external_login_id: None,
            created_at: Utc::now(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, IdentityError> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    pub async fn find_by_name(&self, user_name: &str) -> Result<Option<User>, IdentityError> {
        Ok(users::find_by_normalized_user_name(&self.pool, &Self::normalize(user_name)).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        Ok(users::find_by_normalized_email(&self.pool, &Self::normalize(email)).await?)
    }

    pub async fn find_by_login(&self, provider: &str, provider_key: &str) -> Result<Option<User>, IdentityError> {
        Ok(users::find_by_login(&self.pool, provider, provider_key).await?)
    }

    pub async fn list(&self) -> Result<Vec<User>, IdentityError> {
        Ok(users::list(&self.pool).await?)
    }

    /// Validate and store a new user. Password rules are checked before the user name.
    pub async fn create(&self, mut user: User, password: Option<&str>) -> Result<User, IdentityError> {
        if let Some(password) = password {
            self.validate_password(password)?;
            user.password_hash = Some(self.hasher.hash(password).await?);
        }
        self.validate_user(&user).await?;

        users::insert(&self.pool, &user).await?;
        tracing::info!("User created: {} ({})", user.user_name, user.id);
        Ok(user)
    }

    /// Create a password-less user for an external sign-in; the provider vouches for the email
    pub async fn create_external(
        &self,
        email: &str,
        provider: AuthProvider,
        provider_key: &str,
    ) -> Result<User, IdentityError> {
        let mut user = Self::new_user(email);
        user.email_confirmed = true;
        user.external_login_provider = Some(provider as i64);
        user.external_login_id = Some(provider_key.to_string());
        self.create(user, None).await
    }

    pub async fn update(&self, user: &User) -> Result<(), IdentityError> {
        self.validate_user(user).await?;
        users::update(&self.pool, user).await?;
        Ok(())
    }

    pub fn validate_password(&self, password: &str) -> Result<(), IdentityError> {
        let errors = self.password_options.validate(password);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::Rejected(errors))
        }
    }

    async fn validate_user(&self, user: &User) -> Result<(), IdentityError> {
        let mut errors = Vec::new();

        if user.user_name.is_empty()
            || !user.user_name.chars().all(|c| ALLOWED_USER_NAME_CHARACTERS.contains(c))
        {
            errors.push(IdentityErrorDescriber::invalid_user_name(&user.user_name));
        } else if let Some(owner) =
            users::find_by_normalized_user_name(&self.pool, &user.normalized_user_name).await?
        {
            if owner.id != user.id {
                errors.push(IdentityErrorDescriber::duplicate_user_name(&user.user_name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::Rejected(IdentityErrors(errors)))
        }
    }

    pub async fn check_password(&self, user: &User, password: &str) -> bool {
        match user.password_hash.as_deref() {
            Some(hash) => self.hasher.verify(password, hash).await,
            None => false,
        }
    }

    /// Password sign-in with lockout and the optional second factor
    pub async fn password_sign_in(
        &self,
        user_name: &str,
        password: &str,
        two_factor: TwoFactorInput<'_>,
    ) -> Result<SignInResult, IdentityError> {
        let Some(mut user) = self.find_by_name(user_name).await? else {
            return Ok(SignInResult::Failed);
        };

        if self.require_confirmed_email && !user.email_confirmed {
            tracing::warn!("User {} cannot sign in without a confirmed email", user.id);
            return Ok(SignInResult::NotAllowed);
        }
        if user.is_locked_out(Utc::now()) {
            tracing::warn!("User {} is currently locked out", user.id);
            return Ok(SignInResult::LockedOut);
        }
        if !self.check_password(&user, password).await {
            tracing::debug!("User {} failed to provide the correct password", user.id);
            return self.access_failed(&mut user).await;
        }

        if user.two_factor_enabled {
            if let Some(code) = two_factor.code {
                if !self.verify_two_factor_code(&user, code) {
                    return self.access_failed(&mut user).await;
                }
            } else if let Some(recovery_code) = two_factor.recovery_code {
                if !self.redeem_recovery_code(&mut user, recovery_code).await? {
                    return Ok(SignInResult::Failed);
                }
            } else {
                return Ok(SignInResult::RequiresTwoFactor);
            }
        }

        if user.access_failed_count != 0 {
            user.access_failed_count = 0;
            users::update(&self.pool, &user).await?;
        }
        Ok(SignInResult::Succeeded(Box::new(user)))
    }

    async fn access_failed(&self, user: &mut User) -> Result<SignInResult, IdentityError> {
        if !user.lockout_enabled {
            return Ok(SignInResult::Failed);
        }

        user.access_failed_count += 1;
        let locked = user.access_failed_count >= self.max_failed_access_attempts;
        if locked {
            user.lockout_end = Some(Utc::now() + self.lockout_duration);
            user.access_failed_count = 0;
            tracing::warn!("User {} locked out", user.id);
        }
        users::update(&self.pool, user).await?;

        Ok(if locked { SignInResult::LockedOut } else { SignInResult::Failed })
    }

    pub async fn change_password(
        &self,
        user: &mut User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        if !self.check_password(user, current_password).await {
            tracing::warn!("Change password failed for user {}", user.id);
            return Err(IdentityError::rejected(IdentityErrorDescriber::password_mismatch()));
        }
        self.replace_password(user, new_password).await
    }

    async fn replace_password(&self, user: &mut User, new_password: &str) -> Result<(), IdentityError> {
        self.validate_password(new_password)?;
        user.password_hash = Some(self.hasher.hash(new_password).await?);
        user.security_stamp = new_security_stamp();
        users::update(&self.pool, user).await?;
        Ok(())
    }

    fn generate_user_token(
        &self,
        user: &User,
        purpose: TokenPurpose,
        data: Option<&str>,
    ) -> Result<String, IdentityError> {
        let mut claims = Claims::new(&user.id, purpose, Duration::hours(EMAIL_TOKEN_LIFETIME_HOURS))
            .with_stamp(&user.security_stamp);
        if let Some(data) = data {
            claims = claims.with_data(data);
        }
        Ok(self.tokens.issue(&claims)?)
    }

    /// Token must be for this user, this purpose, and the user's current stamp
    fn verify_user_token(&self, user: &User, token: &str, purpose: TokenPurpose) -> Option<Claims> {
        let claims = self.tokens.validate(token, purpose).ok()?;
        (claims.sub == user.id && claims.stamp == user.security_stamp).then_some(claims)
    }

    pub fn generate_email_confirmation_token(&self, user: &User) -> Result<String, IdentityError> {
        self.generate_user_token(user, TokenPurpose::ConfirmEmail, None)
    }

    pub async fn confirm_email(&self, user: &mut User, token: &str) -> Result<(), IdentityError> {
        if self.verify_user_token(user, token, TokenPurpose::ConfirmEmail).is_none() {
            return Err(IdentityError::rejected(IdentityErrorDescriber::invalid_token()));
        }
        user.email_confirmed = true;
        users::update(&self.pool, user).await?;
        Ok(())
    }

    pub fn generate_change_email_token(&self, user: &User, new_email: &str) -> Result<String, IdentityError> {
        self.generate_user_token(user, TokenPurpose::ChangeEmail, Some(new_email))
    }

    /// Move the user to a confirmed new address. The user name follows the email.
    pub async fn change_email(&self, user: &mut User, new_email: &str, token: &str) -> Result<(), IdentityError> {
        let valid = self
            .verify_user_token(user, token, TokenPurpose::ChangeEmail)
            .is_some_and(|claims| claims.data.as_deref() == Some(new_email));
        if !valid {
            return Err(IdentityError::rejected(IdentityErrorDescriber::invalid_token()));
        }

        let mut changed = user.clone();
        changed.email = Some(new_email.to_string());
        changed.normalized_email = Some(Self::normalize(new_email));
        changed.email_confirmed = true;
        changed.user_name = new_email.to_string();
        changed.normalized_user_name = Self::normalize(new_email);
        changed.security_stamp = new_security_stamp();
        self.update(&changed).await?;

        *user = changed;
        Ok(())
    }

    pub fn generate_password_reset_token(&self, user: &User) -> Result<String, IdentityError> {
        self.generate_user_token(user, TokenPurpose::ResetPassword, None)
    }

    pub async fn reset_password(&self, user: &mut User, token: &str, new_password: &str) -> Result<(), IdentityError> {
        if self.verify_user_token(user, token, TokenPurpose::ResetPassword).is_none() {
            return Err(IdentityError::rejected(IdentityErrorDescriber::invalid_token()));
        }
        self.replace_password(user, new_password).await
    }

    pub async fn roles(&self, user: &User) -> Result<Vec<String>, IdentityError> {
        Ok(users::role_names(&self.pool, &user.id).await?)
    }

    pub async fn is_in_role(&self, user_id: &str, role: &str) -> Result<bool, IdentityError> {
        Ok(users::is_in_role(&self.pool, user_id, &Self::normalize(role)).await?)
    }

    pub async fn add_to_role(&self, user: &User, role: &str) -> Result<(), IdentityError> {
        let Some(stored) = roles::find_by_normalized_name(&self.pool, &Self::normalize(role)).await? else {
            return Err(IdentityError::rejected(IdentityErrorDescriber::role_not_found(role)));
        };
        if users::is_in_role(&self.pool, &user.id, &stored.normalized_name).await? {
            return Err(IdentityError::rejected(IdentityErrorDescriber::user_already_in_role(&stored.name)));
        }
        users::add_to_role(&self.pool, &user.id, &stored.id).await?;
        Ok(())
    }

    pub async fn add_login(&self, user: &User, info: &ExternalLoginInfo) -> Result<(), IdentityError> {
        if users::find_by_login(&self.pool, &info.login_provider, &info.provider_key)
            .await?
            .is_some()
        {
            return Err(IdentityError::rejected(IdentityErrorDescriber::login_already_associated()));
        }

        let login = UserLogin {
            login_provider: info.login_provider.clone(),
            provider_key: info.provider_key.clone(),
            provider_display_name: Some(info.login_provider.clone()),
            user_id: user.id.clone(),
        };
        users::add_login(&self.pool, &login).await?;
        Ok(())
    }

    pub async fn logins(&self, user: &User) -> Result<Vec<UserLogin>, IdentityError> {
        Ok(users::logins(&self.pool, &user.id).await?)
    }

    /// Store the provider's tokens against the user, replacing older values
    pub async fn update_external_tokens(&self, user: &User, info: &ExternalLoginInfo) -> Result<(), IdentityError> {
        for (name, value) in &info.tokens {
            users::set_token(&self.pool, &user.id, &info.login_provider, name, value).await?;
        }
        Ok(())
    }

    pub async fn external_token(&self, user: &User, provider: &str, name: &str) -> Result<Option<String>, IdentityError> {
        Ok(users::get_token(&self.pool, &user.id, provider, name).await?)
    }

    /// Record which provider the user last arrived through
    pub async fn mark_external_login(
        &self,
        user: &mut User,
        provider: AuthProvider,
        provider_key: &str,
    ) -> Result<(), IdentityError> {
        user.external_login_provider = Some(provider as i64);
        user.external_login_id = Some(provider_key.to_string());
        users::update(&self.pool, user).await?;
        Ok(())
    }

    pub async fn set_two_factor_enabled(&self, user: &mut User, enabled: bool) -> Result<(), IdentityError> {
        user.two_factor_enabled = enabled;
        user.security_stamp = new_security_stamp();
        users::update(&self.pool, user).await?;
        Ok(())
    }

    /// Replace the authenticator key; any enrolled authenticator stops working
    pub async fn reset_authenticator_key(&self, user: &mut User) -> Result<String, IdentityError> {
        let key = totp::generate_shared_key();
        user.authenticator_key = Some(key.clone());
        user.security_stamp = new_security_stamp();
        users::update(&self.pool, user).await?;
        Ok(key)
    }

    pub fn verify_two_factor_code(&self, user: &User, code: &str) -> bool {
        user.authenticator_key
            .as_deref()
            .is_some_and(|key| totp::verify(key, code, Utc::now()))
    }

    /// Issue a fresh set of recovery codes; only their hashes are stored
    pub async fn generate_recovery_codes(&self, user: &mut User) -> Result<Vec<String>, IdentityError> {
        let codes = totp::generate_recovery_codes();
        let hashes: Vec<String> = codes.iter().map(|c| totp::hash_recovery_code(c)).collect();
        user.recovery_codes = Some(hashes.join(";"));
        users::update(&self.pool, user).await?;
        Ok(codes)
    }

    /// Consume a recovery code. Each code works once.
    pub async fn redeem_recovery_code(&self, user: &mut User, code: &str) -> Result<bool, IdentityError> {
        let hashed = totp::hash_recovery_code(code);
        let stored = user.recovery_code_hashes();
        if !stored.contains(&hashed.as_str()) {
            return Ok(false);
        }

        let remaining: Vec<&str> = stored.into_iter().filter(|h| *h != hashed).collect();
        user.recovery_codes = Some(remaining.join(";"));
        users::update(&self.pool, user).await?;
        Ok(true)
    }

    pub fn recovery_codes_left(&self, user: &User) -> usize {
        user.recovery_code_hashes().len()
    }
}

fn new_security_stamp() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::DatabaseManager;

    async fn manager() -> UserManager {
        let config = AppConfig::testing();
        let db = DatabaseManager::connect(&config.database).await.unwrap();
        db.migrate().await.unwrap();
        UserManager::new(db.pool().clone(), TokenService::new("unit"), &config.security)
    }

    async fn create(manager: &UserManager, email: &str) -> User {
        manager
            .create(UserManager::new_user(email), Some("Secret1!"))
            .await
            .unwrap()
    }

    #[test]
    fn email_shape() {
        assert!(UserManager::is_valid_email("someone@example.com"));
        assert!(!UserManager::is_valid_email("someone"));
        assert!(!UserManager::is_valid_email("@example.com"));
        assert!(!UserManager::is_valid_email("a@b@c"));
        assert!(!UserManager::is_valid_email("some one@example.com"));
    }

    #[tokio::test]
    async fn rejects_duplicate_user_names_case_insensitively() {
        let manager = manager().await;
        create(&manager, "someone@example.com").await;

        let err = manager
            .create(UserManager::new_user("SOMEONE@example.com"), Some("Secret1!"))
            .await
            .unwrap_err();
        match err {
            IdentityError::Rejected(errors) => assert_eq!(errors.codes(), vec!["DuplicateUserName"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn password_errors_come_before_user_errors() {
        let manager = manager().await;
        let err = manager
            .create(UserManager::new_user("bad name@example.com"), Some("weak"))
            .await
            .unwrap_err();
        match err {
            IdentityError::Rejected(errors) => assert_eq!(errors.0[0].code, "PasswordTooShort"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn locks_out_after_repeated_failures() {
        let manager = manager().await;
        create(&manager, "someone@example.com").await;

        for _ in 0..4 {
            let result = manager
                .password_sign_in("someone@example.com", "wrong", TwoFactorInput::default())
                .await
                .unwrap();
            assert!(matches!(result, SignInResult::Failed));
        }
        let result = manager
            .password_sign_in("someone@example.com", "wrong", TwoFactorInput::default())
            .await
            .unwrap();
        assert!(matches!(result, SignInResult::LockedOut));

        // Even the right password is refused while locked
        let result = manager
            .password_sign_in("someone@example.com", "Secret1!", TwoFactorInput::default())
            .await
            .unwrap();
        assert!(matches!(result, SignInResult::LockedOut));
    }

    #[tokio::test]
    async fn success_resets_the_failure_count() {
        let manager = manager().await;
        create(&manager, "someone@example.com").await;

        manager
            .password_sign_in("someone@example.com", "wrong", TwoFactorInput::default())
            .await
            .unwrap();
        let result = manager
            .password_sign_in("someone@example.com", "Secret1!", TwoFactorInput::default())
            .await
            .unwrap();

        let SignInResult::Succeeded(user) = result else {
            panic!("expected success, got {result:?}");
        };
        assert_eq!(user.access_failed_count, 0);
    }

    #[tokio::test]
    async fn two_factor_sign_in() {
        let manager = manager().await;
        let mut user = create(&manager, "someone@example.com").await;
        let key = manager.reset_authenticator_key(&mut user).await.unwrap();
        manager.set_two_factor_enabled(&mut user, true).await.unwrap();
        let codes = manager.generate_recovery_codes(&mut user).await.unwrap();

        let result = manager
            .password_sign_in("someone@example.com", "Secret1!", TwoFactorInput::default())
            .await
            .unwrap();
        assert!(matches!(result, SignInResult::RequiresTwoFactor));

        let code = totp::code_at(&key, Utc::now()).unwrap();
        let result = manager
            .password_sign_in(
                "someone@example.com",
                "Secret1!",
                TwoFactorInput { code: Some(&code), recovery_code: None },
            )
            .await
            .unwrap();
        assert!(result.succeeded());

        let recovery = TwoFactorInput { code: None, recovery_code: Some(&codes[0]) };
        let first = manager
            .password_sign_in("someone@example.com", "Secret1!", recovery)
            .await
            .unwrap();
        let second = manager
            .password_sign_in("someone@example.com", "Secret1!", recovery)
            .await
            .unwrap();
        assert!(first.succeeded());
        assert!(matches!(second, SignInResult::Failed));
    }

    #[tokio::test]
    async fn reset_tokens_die_with_the_security_stamp() {
        let manager = manager().await;
        let mut user = create(&manager, "someone@example.com").await;
        let token = manager.generate_password_reset_token(&user).unwrap();

        manager.reset_password(&mut user, &token, "Changed1!").await.unwrap();
        assert!(manager.check_password(&user, "Changed1!").await);

        // The reset rotated the stamp, so the same token cannot be replayed
        let err = manager.reset_password(&mut user, &token, "Again1!!").await.unwrap_err();
        assert!(matches!(err, IdentityError::Rejected(e) if e.codes() == vec!["InvalidToken"]));
    }

    #[tokio::test]
    async fn change_email_moves_the_user_name() {
        let manager = manager().await;
        let mut user = create(&manager, "old@example.com").await;
        let token = manager.generate_change_email_token(&user, "new@example.com").unwrap();

        assert!(manager.change_email(&mut user, "other@example.com", &token).await.is_err());
        manager.change_email(&mut user, "new@example.com", &token).await.unwrap();

        let stored = manager.find_by_name("new@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, user.id);
        assert!(stored.email_confirmed);
    }

    #[tokio::test]
    async fn roles_must_exist() {
        let manager = manager().await;
        let user = create(&manager, "someone@example.com").await;

        assert!(manager.add_to_role(&user, "Administrator").await.is_err());

        roles::ensure(&manager.pool, "Administrator").await.unwrap();
        manager.add_to_role(&user, "Administrator").await.unwrap();
        assert!(manager.is_in_role(&user.id, "administrator").await.unwrap());
        assert_eq!(manager.roles(&user).await.unwrap(), vec!["Administrator".to_string()]);
    }
}
