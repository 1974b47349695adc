use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

/// Errors raised by the entity model, the credential manager and the stores.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A field failed its normalization or validation rule.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Storage rejected a write: duplicate username or dangling owner.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Password hashes may not be viewed directly.")]
    AccessDenied,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConstraintViolation(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AccessDenied | Self::Hashing(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Map a model error onto the `(StatusCode, String)` rejection used by handlers.
pub fn reject(e: ModelError) -> (StatusCode, String) {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "request failed");
        return (status, "Internal server error".into());
    }
    (status, e.to_string())
}
