use thiserror::Error;

use crate::domain::user::UnknownRole;
use crate::flows::{WorkflowError, WorkflowErrorKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("authentication failure: {0}")]
    Authentication(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("contract mismatch: {0}")]
    Contract(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<WorkflowError> for ApplicationError {
    fn from(value: WorkflowError) -> Self {
        Self::Domain(DomainError::Workflow(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("bad gateway: {message}")]
    BadGateway { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The record does not exist or is not visible to your role.",
            Self::Conflict { .. } => {
                "The record changed since it was loaded. Reload it before acting again."
            }
            Self::Forbidden { .. } => "Your role is not allowed to perform this action.",
            Self::Unauthorized { .. } => "Your session is missing or expired. Log in again.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::BadGateway { .. } => {
                "The backend answered in an unexpected format. Check that client and backend versions match."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    /// Stable machine-readable class, used as `error_class` in CLI output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Forbidden { .. } => "forbidden",
            Self::Unauthorized { .. } => "unauthorized",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::BadGateway { .. } => "bad_gateway",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::Forbidden { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::BadGateway { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::BadGateway { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Workflow(error))
                if error.kind() == WorkflowErrorKind::StaleState =>
            {
                Self::Conflict { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Forbidden(message) => Self::Forbidden { message, correlation_id },
            ApplicationError::Authentication(message) => {
                Self::Unauthorized { message, correlation_id }
            }
            ApplicationError::NotFound(message) => Self::NotFound { message, correlation_id },
            ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Contract(message) => Self::BadGateway { message, correlation_id },
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::user::UnknownRole;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::{EntityKind, WorkflowError};

    #[test]
    fn workflow_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(WorkflowError::MissingReason).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.error_class(), "bad_request");
        assert_eq!(interface.message(), "a rejection requires a non-empty reason");
    }

    #[test]
    fn stale_state_maps_to_conflict() {
        let interface = ApplicationError::from(WorkflowError::StaleState {
            entity: EntityKind::Quote,
            observed: "CREATED".to_owned(),
            latest: "APPROVED".to_owned(),
        })
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Conflict { .. }));
        assert_eq!(
            interface.user_message(),
            "The record changed since it was loaded. Reload it before acting again."
        );
    }

    #[test]
    fn unknown_role_is_a_bad_request() {
        let interface =
            ApplicationError::from(DomainError::from(UnknownRole("supervisor".to_owned())))
                .into_interface("req-3");

        assert_eq!(interface.error_class(), "bad_request");
    }

    #[test]
    fn integration_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Integration("backend returned 502".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn forbidden_and_authentication_keep_distinct_classes() {
        let forbidden = ApplicationError::Forbidden("admin only".to_owned()).into_interface("req-5");
        let unauthorized =
            ApplicationError::Authentication("token expired".to_owned()).into_interface("req-6");

        assert_eq!(forbidden.error_class(), "forbidden");
        assert_eq!(unauthorized.error_class(), "unauthorized");
    }

    #[test]
    fn missing_records_and_contract_mismatches_have_their_own_classes() {
        let missing =
            ApplicationError::NotFound("demand 7 was not found".to_owned()).into_interface("req-8");
        assert_eq!(missing.error_class(), "not_found");
        assert_eq!(missing.message(), "demand 7 was not found");

        let mismatch = ApplicationError::Contract("missing field `status`".to_owned())
            .into_interface("req-9");
        assert!(matches!(mismatch, InterfaceError::BadGateway { .. }));
        assert!(!mismatch.user_message().contains("retry"));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("invalid base url".to_owned()).into_interface("req-7");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
