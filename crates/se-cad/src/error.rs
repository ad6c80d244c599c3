//! Session Errors
//!
//! Every public session and dispatch operation returns [`SessionResult`].
//! Engine failures are converted into [`SessionError`] at the boundary and
//! never escape as raw [`EngineError`] values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::EngineError;

/// Coarse classification of a [`SessionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidState,
    InvalidReference,
    InvalidParameter,
    ValidationFailure,
    InsufficientProfiles,
    UnknownMethod,
    ExternalEngineError,
}

impl ErrorKind {
    /// Get the wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::InsufficientProfiles => "insufficient_profiles",
            ErrorKind::UnknownMethod => "unknown_method",
            ErrorKind::ExternalEngineError => "external_engine_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for sketch session and feature dispatch operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailure {
        message: String,
        diagnostic: Option<String>,
    },

    #[error("{family} requires at least {required} profiles, got {available}")]
    InsufficientProfiles {
        family: String,
        required: usize,
        available: usize,
    },

    #[error("Unknown method: {method}")]
    UnknownMethod { family: String, method: String },

    #[error("{operation} failed: {diagnostic}")]
    ExternalEngine {
        operation: String,
        diagnostic: String,
    },
}

impl SessionError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SessionError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation failure without an engine diagnostic
    pub fn validation(message: impl Into<String>) -> Self {
        SessionError::ValidationFailure {
            message: message.into(),
            diagnostic: None,
        }
    }

    /// Convert an engine failure raised while performing `operation`
    pub fn from_engine(operation: impl Into<String>, error: EngineError) -> Self {
        let operation = operation.into();
        match error {
            EngineError::NotFound(what) => SessionError::InvalidReference(what),
            EngineError::ProfileRejected(diagnostic) => SessionError::ValidationFailure {
                message: format!("{operation} rejected by engine"),
                diagnostic: Some(diagnostic),
            },
            other => SessionError::ExternalEngine {
                operation,
                diagnostic: other.to_string(),
            },
        }
    }

    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidState(_) => ErrorKind::InvalidState,
            SessionError::InvalidReference(_) => ErrorKind::InvalidReference,
            SessionError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            SessionError::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            SessionError::InsufficientProfiles { .. } => ErrorKind::InsufficientProfiles,
            SessionError::UnknownMethod { .. } => ErrorKind::UnknownMethod,
            SessionError::ExternalEngine { .. } => ErrorKind::ExternalEngineError,
        }
    }

    /// Raw engine diagnostic, if the engine produced one
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            SessionError::ValidationFailure { diagnostic, .. } => diagnostic.as_deref(),
            SessionError::ExternalEngine { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Reject a non-finite number
pub fn ensure_finite(name: &str, value: f64) -> SessionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SessionError::invalid_parameter(
            name,
            format!("must be a finite number, got {value}"),
        ))
    }
}

/// Reject a number that is not finite and strictly positive
pub fn ensure_positive(name: &str, value: f64) -> SessionResult<()> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SessionError::invalid_parameter(
            name,
            format!("must be greater than zero, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_conversion() {
        let err = SessionError::from_engine(
            "Close profile",
            EngineError::ProfileRejected("open loop".into()),
        );
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(err.diagnostic(), Some("open loop"));

        let err = SessionError::from_engine("Resolve plane", EngineError::NotFound("plane 9".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert_eq!(err.diagnostic(), None);

        let err = SessionError::from_engine(
            "Extrude",
            EngineError::OperationFailed("recompute error".into()),
        );
        assert_eq!(err.kind(), ErrorKind::ExternalEngineError);
        assert!(err.diagnostic().is_some_and(|d| d.contains("recompute error")));
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("distance", 0.05).is_ok());
        assert!(ensure_finite("distance", -1.0).is_ok());

        let err = ensure_finite("diameter", f64::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(ensure_finite("diameter", f64::INFINITY).is_err());
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("radius", 0.005).is_ok());
        assert!(ensure_positive("radius", 0.0).is_err());
        assert!(ensure_positive("radius", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ErrorKind::ExternalEngineError.as_str(), "external_engine_error");
        let json = serde_json::to_string(&ErrorKind::InsufficientProfiles).unwrap();
        assert_eq!(json, "\"insufficient_profiles\"");
    }
}
