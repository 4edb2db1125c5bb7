// handlers/public/users/mod.rs - /api/Users account endpoints (no auth required)

pub mod confirm_email;
pub mod google;
pub mod login;
pub mod logout;
pub mod password;
pub mod refresh;
pub mod register;

pub use confirm_email::{confirm_email_get, resend_confirmation_email_post, send_confirmation_email};
pub use google::{google_callback_get, google_sign_in_get};
pub use login::login_post;
pub use logout::logout_post;
pub use password::{forgot_password_post, reset_password_post};
pub use refresh::refresh_post;
pub use register::register_post;
