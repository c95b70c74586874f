pub mod clock;
pub mod dates;
pub mod identity;
pub mod lifecycle;
pub mod mail;
pub mod memory;
pub mod projection;
pub mod repository;
pub mod storage;

use serde::Serialize;

/// Machine-readable failure category surfaced to the UI layer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Precondition,
    NotFound,
    Authorization,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Precondition failed: {0}")]
    PreconditionError(String),
    #[error("{entity} not found: {id}")]
    NotFoundError { entity: &'static str, id: i64 },
    #[error("Not authorized: {0}")]
    AuthorizationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ValidationError(_) => ErrorKind::Validation,
            CoreError::PreconditionError(_) => ErrorKind::Precondition,
            CoreError::NotFoundError { .. } => ErrorKind::NotFound,
            CoreError::AuthorizationError(_) => ErrorKind::Authorization,
            CoreError::InternalError(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFoundError { entity, id }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        CoreError::InternalError(err.to_string())
    }
}

impl From<tourdesk_shared::UnknownStatus> for CoreError {
    fn from(err: tourdesk_shared::UnknownStatus) -> Self {
        CoreError::InternalError(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
