//! Password recovery core.
//!
//! Flow Overview:
//! 1) Validate the request (`InvalidArgument` before any side effect).
//! 2) Self-serve: consult the [`RateLimiter`]. Admin: consult the [`AuthorizationGate`].
//! 3) Ask the [`CredentialIssuer`] for a reset link or a temporary password.
//! 4) Notify through the [`Notifier`] when an email channel is configured, otherwise
//!    hand the link back to the caller.
//!
//! Security boundaries:
//! - Self-serve responses do not depend on whether the account exists.
//! - A temporary password is always followed by session revocation.
//! - Role lookups are scoped to the tenant (`app_id`) named in the request.

pub mod authz;
pub mod config;
pub mod credentials;
pub mod error;
pub mod identity_http;
pub mod notify;
pub mod rate_limit;
pub mod sendgrid;
pub mod storage;
pub mod types;
mod utils;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_support;

pub use authz::{AuthorizationGate, CallerIdentity, MemoryRoleStore, RoleStore, TrustedClaims};
pub use config::RecoveryConfig;
pub use credentials::{
    ActionCodeSettings, CredentialIssuer, IdentityProvider, ProviderFailure, ProviderUser,
};
pub use error::RecoveryError;
pub use identity_http::HttpIdentityProvider;
pub use notify::{EmailMessage, EmailSender, Notifier};
pub use rate_limit::{Clock, MemoryThrottleStore, RateLimiter, SystemClock, ThrottleStore};
pub use sendgrid::SendGridEmailSender;
pub use storage::{PgRoleStore, PgThrottleStore};
pub use types::{
    AdminResetRequest, AdminResetResponse, PasswordResetRequest, PasswordResetResponse, ResetMode,
};
pub use workflows::RecoveryWorkflows;
