use std::fmt::Display;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::identity::IdentityError;
use crate::pipeline::validation::ValidationFailures;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("One or more validation failures have occurred.")]
    Validation(ValidationFailures),

    #[error("Entity \"{entity}\" ({key}) was not found.")]
    NotFound { entity: &'static str, key: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, key: impl Display) -> Self {
        PipelineError::NotFound { entity, key: key.to_string() }
    }

    /// Failures that are not part of a request's expected outcomes
    pub fn is_unhandled(&self) -> bool {
        matches!(self, PipelineError::Database(_) | PipelineError::Identity(_))
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::Database(DatabaseError::Sqlx(err))
    }
}
