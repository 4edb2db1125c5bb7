use std::fmt;

use crate::auth::TokenError;
use crate::database::DatabaseError;
use crate::error::FieldErrors;

/// A single rejected identity operation: a stable code plus a human description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityErrorDescriber {
    pub code: &'static str,
    pub description: String,
}

impl IdentityErrorDescriber {
    fn new(code: &'static str, description: impl Into<String>) -> Self {
        Self { code, description: description.into() }
    }

    pub fn password_too_short(length: usize) -> Self {
        Self::new("PasswordTooShort", format!("Passwords must be at least {} characters.", length))
    }

    pub fn password_requires_non_alphanumeric() -> Self {
        Self::new(
            "PasswordRequiresNonAlphanumeric",
            "Passwords must have at least one non alphanumeric character.",
        )
    }

    pub fn password_requires_digit() -> Self {
        Self::new("PasswordRequiresDigit", "Passwords must have at least one digit ('0'-'9').")
    }

    pub fn password_requires_lower() -> Self {
        Self::new("PasswordRequiresLower", "Passwords must have at least one lowercase ('a'-'z').")
    }

    pub fn password_requires_upper() -> Self {
        Self::new("PasswordRequiresUpper", "Passwords must have at least one uppercase ('A'-'Z').")
    }

    pub fn password_requires_unique_chars(count: usize) -> Self {
        Self::new(
            "PasswordRequiresUniqueChars",
            format!("Passwords must use at least {} different characters.", count),
        )
    }

    pub fn password_mismatch() -> Self {
        Self::new("PasswordMismatch", "Incorrect password.")
    }

    pub fn invalid_token() -> Self {
        Self::new("InvalidToken", "Invalid token.")
    }

    pub fn invalid_email(email: &str) -> Self {
        Self::new("InvalidEmail", format!("Email '{}' is invalid.", email))
    }

    pub fn invalid_user_name(name: &str) -> Self {
        Self::new(
            "InvalidUserName",
            format!("Username '{}' is invalid, can only contain letters or digits.", name),
        )
    }

    pub fn duplicate_user_name(name: &str) -> Self {
        Self::new("DuplicateUserName", format!("Username '{}' is already taken.", name))
    }

    pub fn login_already_associated() -> Self {
        Self::new("LoginAlreadyAssociated", "A user with this login already exists.")
    }

    pub fn user_already_in_role(role: &str) -> Self {
        Self::new("UserAlreadyInRole", format!("User already in role '{}'.", role))
    }

    pub fn role_not_found(role: &str) -> Self {
        Self::new("RoleNotFound", format!("Role {} does not exist.", role))
    }
}

/// Every reason an identity operation was refused
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityErrors(pub Vec<IdentityErrorDescriber>);

impl IdentityErrors {
    pub fn single(error: IdentityErrorDescriber) -> Self {
        Self(vec![error])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.code).collect()
    }

    /// Validation problem shape: descriptions grouped under their error code
    pub fn into_field_errors(self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for error in self.0 {
            errors.entry(error.code.to_string()).or_default().push(error.description);
        }
        errors
    }
}

impl fmt::Display for IdentityErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let descriptions: Vec<&str> = self.0.iter().map(|e| e.description.as_str()).collect();
        write!(f, "{}", descriptions.join(" "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{0}")]
    Rejected(IdentityErrors),

    #[error("user not found")]
    UserNotFound,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IdentityError {
    pub fn rejected(error: IdentityErrorDescriber) -> Self {
        IdentityError::Rejected(IdentityErrors::single(error))
    }
}

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        IdentityError::Database(DatabaseError::Sqlx(err))
    }
}
