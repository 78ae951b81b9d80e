//! Error types for `buildgate`.

use thiserror::Error;

use crate::permissions::Capability;
use crate::resource::ResourceKind;

/// Result type alias using the ambient `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Ambient errors: configuration, serialization, I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a rejected command.
///
/// Every variant is terminal for the request that produced it. The first
/// failing check in a command decides which one is returned.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No authenticated actor. Mapped to 403, not 401, for compatibility
    /// with existing clients.
    #[error("login required")]
    LoginRequired,

    /// Resource absent or invisible to the actor; the two cases are
    /// deliberately indistinguishable.
    #[error("{resource_type} not found (or insufficient access)")]
    NotFound { resource_type: ResourceKind },

    /// A required identifier or parameter was missing.
    #[error("{0}")]
    WrongParams(String),

    #[error("operation requires {permission} access to {resource_type}")]
    InsufficientAccess {
        resource_type: ResourceKind,
        permission: Capability,
    },

    #[error("build is not running, cannot cancel")]
    BuildNotCancelable,

    #[error("build already running, cannot restart")]
    BuildAlreadyRunning,

    #[error("job already running, cannot restart")]
    JobAlreadyRunning,

    /// Request-level validation failure with an explicit status.
    #[error("{message}")]
    Validation { message: String, status: u16 },

    /// The queue transport refused or could not be reached.
    #[error("could not enqueue work: {0}")]
    Dispatch(String),

    /// Storage or other unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommandError {
    /// 422 validation failure.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            status: 422,
        }
    }

    /// Machine-readable kind, as written to `error_type`.
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::LoginRequired => "login_required",
            Self::NotFound { .. } => "not_found",
            Self::WrongParams(_) => "wrong_params",
            Self::InsufficientAccess { .. } => "insufficient_access",
            Self::BuildNotCancelable => "build_not_cancelable",
            Self::BuildAlreadyRunning => "build_already_running",
            Self::JobAlreadyRunning => "job_already_running",
            Self::Validation { .. } => "error",
            Self::Dispatch(_) => "dispatch_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status code for the error body.
    pub const fn status(&self) -> u16 {
        match self {
            Self::LoginRequired | Self::InsufficientAccess { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::WrongParams(_) => 400,
            Self::BuildNotCancelable | Self::BuildAlreadyRunning | Self::JobAlreadyRunning => 409,
            Self::Validation { status, .. } => *status,
            Self::Dispatch(_) | Self::Internal(_) => 500,
        }
    }

    pub const fn resource_type(&self) -> Option<ResourceKind> {
        match self {
            Self::NotFound { resource_type } | Self::InsufficientAccess { resource_type, .. } => {
                Some(*resource_type)
            }
            _ => None,
        }
    }

    /// Capability that was denied, for `insufficient_access`.
    pub const fn permission(&self) -> Option<Capability> {
        match self {
            Self::InsufficientAccess { permission, .. } => Some(*permission),
            _ => None,
        }
    }

    /// Message exposed to the caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Dispatch(_) => "could not enqueue work".to_string(),
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<crate::db::DatabaseError> for CommandError {
    fn from(e: crate::db::DatabaseError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn login_required_maps_to_forbidden() {
        let err = CommandError::LoginRequired;
        assert_eq!(err.status(), 403);
        assert_eq!(err.error_type(), "login_required");
        assert_eq!(err.to_string(), "login required");
    }

    #[test]
    fn not_found_names_resource() {
        let err = CommandError::NotFound {
            resource_type: ResourceKind::Job,
        };
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "job not found (or insufficient access)");
        assert_eq!(err.resource_type(), Some(ResourceKind::Job));
        assert_eq!(err.permission(), None);
    }

    #[test]
    fn insufficient_access_names_permission() {
        let err = CommandError::InsufficientAccess {
            resource_type: ResourceKind::Build,
            permission: Capability::Cancel,
        };
        assert_eq!(err.status(), 403);
        assert_eq!(
            err.to_string(),
            "operation requires cancel access to build"
        );
        assert_eq!(err.permission(), Some(Capability::Cancel));
    }

    #[test]
    fn state_conflicts_are_409() {
        for err in [
            CommandError::BuildNotCancelable,
            CommandError::BuildAlreadyRunning,
            CommandError::JobAlreadyRunning,
        ] {
            assert_eq!(err.status(), 409);
        }
    }

    #[test]
    fn internal_details_are_not_public() {
        let err = CommandError::Internal("disk on fire".into());
        assert_eq!(err.status(), 500);
        assert_eq!(err.public_message(), "internal error");
    }
}
