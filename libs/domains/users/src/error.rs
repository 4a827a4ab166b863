use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a [`crate::repository::UserRepository`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("Old password is incorrect")]
    InvalidCredential,

    #[error("Password confirmation does not match")]
    ConfirmationMismatch,

    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// Route-level failure message shown to the client as-is.
    #[error("{0}")]
    Unprocessable(&'static str),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Collapse "no such user" and store failures into a 422 with `message`.
    ///
    /// Used by the create/update/delete routes, which report any persistence
    /// outcome other than success the same way. Other variants pass through.
    pub fn or_unprocessable(self, message: &'static str) -> Self {
        match self {
            UserError::NotFound(_) | UserError::Persistence(_) => {
                tracing::warn!(error = %self, "{}", message);
                UserError::Unprocessable(message)
            }
            other => other,
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            UserError::InvalidCredential | UserError::ConfirmationMismatch => {
                AppError::Forbidden(err.to_string())
            }
            UserError::Unprocessable(msg) => AppError::UnprocessableEntity(msg.to_string()),
            UserError::Persistence(e) => AppError::InternalServerError(e.to_string()),
            UserError::PasswordHash(msg) | UserError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
