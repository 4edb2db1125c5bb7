use std::collections::HashSet;

use argon2::password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use super::errors::{IdentityError, IdentityErrorDescriber, IdentityErrors};

/// Complexity rules applied to every new password
#[derive(Debug, Clone)]
pub struct PasswordOptions {
    pub required_length: usize,
    pub required_unique_chars: usize,
    pub require_non_alphanumeric: bool,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            required_length: 6,
            required_unique_chars: 1,
            require_non_alphanumeric: true,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
        }
    }
}

impl PasswordOptions {
    /// Every rule the password breaks, in a stable order
    pub fn validate(&self, password: &str) -> IdentityErrors {
        let mut errors = Vec::new();

        if password.chars().count() < self.required_length {
            errors.push(IdentityErrorDescriber::password_too_short(self.required_length));
        }
        // Only ASCII letters and digits count as alphanumeric
        if self.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(IdentityErrorDescriber::password_requires_non_alphanumeric());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(IdentityErrorDescriber::password_requires_digit());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push(IdentityErrorDescriber::password_requires_lower());
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(IdentityErrorDescriber::password_requires_upper());
        }
        if self.required_unique_chars >= 1
            && password.chars().collect::<HashSet<_>>().len() < self.required_unique_chars
        {
            errors.push(IdentityErrorDescriber::password_requires_unique_chars(self.required_unique_chars));
        }

        IdentityErrors(errors)
    }
}

/// Argon2id hashing into PHC strings. Runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Self {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None).unwrap_or_else(|e| {
            tracing::warn!("Invalid password hashing parameters ({}), using defaults", e);
            Params::default()
        });
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub async fn hash(&self, password: &str) -> Result<String, IdentityError> {
        let argon2 = self.argon2();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let mut salt = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut salt);
            let salt = SaltString::encode_b64(&salt)?;
            Ok::<_, password_hash::Error>(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
        })
        .await
        .map_err(|e| IdentityError::Hashing(e.to_string()))?
        .map_err(|e| IdentityError::Hashing(e.to_string()))
    }

    /// A malformed stored hash verifies as false
    pub async fn verify(&self, password: &str, hash: &str) -> bool {
        let argon2 = self.argon2();
        let (password, hash) = (password.to_owned(), hash.to_owned());

        tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
            Ok(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_complex_password() {
        assert!(PasswordOptions::default().validate("Administrator1!").is_empty());
    }

    #[test]
    fn reports_every_broken_rule() {
        let errors = PasswordOptions::default().validate("abc");
        assert_eq!(
            errors.codes(),
            vec![
                "PasswordTooShort",
                "PasswordRequiresNonAlphanumeric",
                "PasswordRequiresDigit",
                "PasswordRequiresUpper",
            ]
        );
    }

    #[test]
    fn non_ascii_letters_count_as_symbols() {
        let errors = PasswordOptions::default().validate("Passwörd1");
        assert!(errors.is_empty());
    }

    #[test]
    fn empty_password_fails_every_rule() {
        let errors = PasswordOptions::default().validate("");
        assert_eq!(errors.0.len(), 6);
        assert_eq!(errors.0[0].description, "Passwords must be at least 6 characters.");
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1024, 1)
    }

    #[tokio::test]
    async fn hashes_verify() {
        let hasher = hasher();
        let hash = hasher.hash("Secret1!").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Secret1!", &hash).await);
        assert!(!hasher.verify("secret1!", &hash).await);
        assert!(!hasher.verify("Secret1!", "not-a-hash").await);
    }

    #[tokio::test]
    async fn long_passwords_are_not_truncated() {
        let hasher = hasher();
        let long = format!("Aa1!{}", "x".repeat(80));
        let hash = hasher.hash(&long).await.unwrap();

        assert!(hasher.verify(&long, &hash).await);
        assert!(!hasher.verify(&format!("{}YYYY", long), &hash).await);
    }

    #[test]
    fn invalid_parameters_fall_back_to_defaults() {
        let hasher = PasswordHasher::new(0, 0);
        assert_eq!(hasher.params.m_cost(), Params::DEFAULT_M_COST);
    }
}
