use gestibank_core::domain::user::{Role, UnknownRole};
use gestibank_core::errors::{ApplicationError, DomainError};
use gestibank_core::flows::{EntityKind, WorkflowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session token configured; run `gestibank login` or set GESTIBANK_AUTH_TOKEN")]
    Missing,
    #[error("session token is malformed: {0}")]
    Malformed(String),
    #[error("session token has expired")]
    Expired,
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("{role} is not allowed to {operation}")]
    Forbidden { role: Role, operation: &'static str },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{entity} {id} was not found")]
    NotFound { entity: EntityKind, id: i64 },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<ServiceError> for ApplicationError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Workflow(error) => ApplicationError::from(error),
            ServiceError::Forbidden { .. } => ApplicationError::Forbidden(value.to_string()),
            ServiceError::Validation(message) => {
                ApplicationError::Domain(DomainError::InvariantViolation(message))
            }
            ServiceError::NotFound { .. } => ApplicationError::NotFound(value.to_string()),
            ServiceError::Backend(error @ BackendError::Decode(_)) => {
                ApplicationError::Contract(error.to_string())
            }
            ServiceError::Backend(error) => match error.status() {
                Some(401) => ApplicationError::Authentication(error.to_string()),
                Some(403) => ApplicationError::Forbidden(error.to_string()),
                Some(404) => ApplicationError::NotFound(error.to_string()),
                _ => ApplicationError::Integration(error.to_string()),
            },
            ServiceError::Session(error) => ApplicationError::Authentication(error.to_string()),
        }
    }
}
