use async_trait::async_trait;

use crate::database::models::User;

/// Outbound account mail: confirmation links and password reset codes
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_confirmation_link(&self, user: &User, email: &str, confirmation_link: &str);

    async fn send_password_reset_code(&self, user: &User, email: &str, reset_code: &str);
}

/// Writes messages to the log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send_confirmation_link(&self, user: &User, email: &str, confirmation_link: &str) {
        tracing::info!(
            user_id = %user.id,
            to = %email,
            "Confirm your email: please confirm your account by visiting {}",
            confirmation_link
        );
    }

    async fn send_password_reset_code(&self, user: &User, email: &str, reset_code: &str) {
        tracing::info!(
            user_id = %user.id,
            to = %email,
            "Reset your password: please reset your password using the following code: {}",
            reset_code
        );
    }
}
