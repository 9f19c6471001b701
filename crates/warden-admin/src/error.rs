//! Errors returned by admin operations.

use thiserror::Error;
use warden_backend::BackendError;

/// Hard stops for an admin operation.
///
/// Mutations never surface store failures here; they log them and report
/// `false`/`None`. Reads propagate them as [`AdminError::Backend`].
#[derive(Debug, Error)]
pub enum AdminError {
    /// No session on the context.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The caller is authenticated but not a super admin. `location` is the
    /// landing page the caller should be sent to.
    #[error("access denied, diverted to {location}")]
    Diverted { location: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AdminError {
    /// Whether this error is an authorization stop rather than a store failure.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Diverted { .. })
    }
}

/// Result alias for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;
