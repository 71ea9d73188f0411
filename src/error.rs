use thiserror::Error;

use crate::services::form_schema::{FieldError, SchemaCompileError};

/// Engine-level outcome taxonomy. Routes translate these to HTTP statuses;
/// services never panic past this boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("not found")]
    NotFound,

    #[error("already completed")]
    AlreadyCompleted,

    #[error("concurrent update conflict")]
    Conflict,

    #[error("credential generation failed: {0}")]
    Credential(String),

    #[error("form definition invalid: {0}")]
    Schema(#[from] SchemaCompileError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl EngineError {
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            EngineError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
