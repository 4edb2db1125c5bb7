//! Account management: users, passwords, roles, lockout, two-factor and external logins.

pub mod email;
pub mod errors;
pub mod manager;
pub mod password;
pub mod service;

pub use email::{EmailSender, LoggingEmailSender};
pub use errors::{IdentityError, IdentityErrorDescriber, IdentityErrors};
pub use manager::{SignInResult, TwoFactorInput, UserManager};
pub use password::{PasswordHasher, PasswordOptions};
pub use service::IdentityService;
