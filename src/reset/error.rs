//! Error taxonomy shared by every recovery operation.

use thiserror::Error;

const REDACTED_MESSAGE: &str = "Password reset could not be completed, try again later.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// Client input is malformed. Always checked before any side effect.
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Too many requests, try again later.")]
    RateLimitExceeded,
    #[error("Admin privileges required.")]
    PermissionDenied,
    #[error("No account matches the requested email.")]
    UserNotFound,
    #[error("Identity provider error: {0}")]
    Provider(String),
    /// The email channel failed after any credential mutation already happened.
    #[error("Email delivery failed: {0}")]
    Notification(String),
    /// The persistence backend could not be reached or failed mid-transaction.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl RecoveryError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable, machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid-argument",
            Self::RateLimitExceeded => "resource-exhausted",
            Self::PermissionDenied => "permission-denied",
            Self::UserNotFound => "not-found",
            Self::Provider(_) => "internal",
            Self::Notification(_) => "notification-failed",
            Self::Unavailable(_) => "unavailable",
        }
    }

    /// Strip provider and backend details before the error reaches an
    /// unauthenticated caller. The code is kept.
    #[must_use]
    pub fn redacted(self) -> Self {
        match self {
            Self::Provider(_) => Self::Provider(REDACTED_MESSAGE.to_string()),
            Self::Notification(_) => Self::Notification(REDACTED_MESSAGE.to_string()),
            Self::Unavailable(_) => Self::Unavailable(REDACTED_MESSAGE.to_string()),
            other => other,
        }
    }

    /// Human-readable message without the kind prefix added by `Display`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Provider(message) | Self::Notification(message) | Self::Unavailable(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
