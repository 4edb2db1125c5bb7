// HTTP API Error Types
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Field name -> messages, rendered as the `errors` member of a validation problem.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// HTTP API error rendered as RFC 7807 problem details
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(Option<String>),
    Validation(FieldErrors),

    // 401 Unauthorized
    Unauthorized(Option<String>),

    // 403 Forbidden
    Forbidden(Option<String>),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Problem type URI for the status
    pub fn problem_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => {
                "https://tools.ietf.org/html/rfc9110#section-15.5.1"
            }
            ApiError::Unauthorized(_) => "https://tools.ietf.org/html/rfc9110#section-15.5.2",
            ApiError::Forbidden(_) => "https://tools.ietf.org/html/rfc9110#section-15.5.4",
            ApiError::NotFound(_) => "https://tools.ietf.org/html/rfc9110#section-15.5.5",
            ApiError::InternalServerError(_) => "https://tools.ietf.org/html/rfc9110#section-15.6.1",
            ApiError::ServiceUnavailable(_) => "https://tools.ietf.org/html/rfc9110#section-15.6.4",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::Validation(_) => "One or more validation errors occurred.",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "The specified resource was not found.",
            ApiError::InternalServerError(_) => "An error occurred while processing your request.",
            ApiError::ServiceUnavailable(_) => "Service Unavailable",
        }
    }

    /// Get client-safe detail message
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) => {
                msg.as_deref()
            }
            ApiError::Validation(_) => None,
            ApiError::NotFound(msg) => Some(msg),
            ApiError::InternalServerError(msg) => Some(msg),
            ApiError::ServiceUnavailable(msg) => Some(msg),
        }
    }

    /// Convert to problem details body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "type": self.problem_type(),
            "title": self.title(),
            "status": self.status_code().as_u16(),
        });

        if let Some(detail) = self.detail() {
            body["detail"] = json!(detail);
        }

        if let ApiError::Validation(errors) = self {
            body["errors"] = json!(errors);
        }

        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request() -> Self {
        ApiError::BadRequest(None)
    }

    pub fn validation(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }

    /// Single-field validation failure
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(None)
    }

    pub fn unauthorized_with(detail: impl Into<String>) -> Self {
        ApiError::Unauthorized(Some(detail.into()))
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden(None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::DatabaseError> for ApiError {
    fn from(err: crate::database::DatabaseError) -> Self {
        match err {
            crate::database::DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::DatabaseError::ConnectionError(msg) => {
                tracing::error!("Database connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::DatabaseError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::pipeline::PipelineError> for ApiError {
    fn from(err: crate::pipeline::PipelineError) -> Self {
        use crate::pipeline::PipelineError;

        match err {
            PipelineError::Validation(failures) => ApiError::Validation(failures.into_field_errors()),
            PipelineError::NotFound { entity, key } => {
                ApiError::not_found(format!("Queried object {} was not found, Key: {}", entity, key))
            }
            PipelineError::Unauthorized => ApiError::unauthorized(),
            PipelineError::Forbidden => ApiError::forbidden(),
            PipelineError::Database(e) => e.into(),
            PipelineError::Identity(e) => e.into(),
        }
    }
}

impl From<crate::identity::IdentityError> for ApiError {
    fn from(err: crate::identity::IdentityError) -> Self {
        use crate::identity::IdentityError;

        match err {
            IdentityError::Rejected(errors) => ApiError::Validation(errors.into_field_errors()),
            IdentityError::UserNotFound => ApiError::not_found("User not found"),
            IdentityError::Database(e) => e.into(),
            IdentityError::Token(e) => e.into(),
            IdentityError::Hashing(msg) => {
                tracing::error!("Password hashing error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        match err {
            crate::auth::TokenError::Generation(msg) => {
                tracing::error!("Token generation error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            other => {
                tracing::debug!("Token rejected: {}", other);
                ApiError::unauthorized()
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.title(), detail),
            None => write!(f, "{}", self.title()),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self.to_json()),
        )
            .into_response()
    }
}
