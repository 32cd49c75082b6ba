// src/utils/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Covers both "nothing matched" and "best match below threshold".
    #[error("Identity not recognized")]
    NoMatch,

    #[error("Duplicate enrollment: {0}")]
    DuplicateEnrollment(String),

    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    #[error("Concurrent sequence update detected for identity {0}")]
    SequenceConflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("Operation timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AttendanceError {
    /// Stable machine-readable code used in API error bodies and audit logs.
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::MalformedInput(_) => "malformed_input",
            AttendanceError::NoMatch => "no_match",
            AttendanceError::DuplicateEnrollment(_) => "duplicate_enrollment",
            AttendanceError::IdentityNotFound(_) => "identity_not_found",
            AttendanceError::SequenceConflict(_) => "sequence_conflict",
            AttendanceError::StoreUnavailable(_) => "store_unavailable",
            AttendanceError::Unauthorized => "unauthorized",
            AttendanceError::Timeout => "timeout",
            AttendanceError::Config(_) => "config_error",
            AttendanceError::Internal(_) => "internal_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AttendanceError::MalformedInput(_)
                | AttendanceError::NoMatch
                | AttendanceError::DuplicateEnrollment(_)
                | AttendanceError::IdentityNotFound(_)
                | AttendanceError::SequenceConflict(_)
                | AttendanceError::Unauthorized
        )
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message_is_opaque() {
        assert_eq!(AttendanceError::NoMatch.to_string(), "Identity not recognized");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AttendanceError::MalformedInput("x".into()).is_client_error());
        assert!(AttendanceError::Unauthorized.is_client_error());
        assert!(!AttendanceError::StoreUnavailable("down".into()).is_client_error());
        assert!(!AttendanceError::Timeout.is_client_error());
    }
}
