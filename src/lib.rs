//! # Recovery (Password Reset Authority)
//!
//! `recovery` issues password-reset credentials for the tenants (apps) of the
//! platform. It exposes two operations:
//!
//! - **Self-serve reset:** anyone may ask for a reset link for an email address.
//!   Requests are throttled per `(email, client IP)` and the response never
//!   reveals whether the account exists.
//! - **Admin-initiated reset:** an administrator of the tenant either sends a
//!   reset link or sets a temporary password. Setting a temporary password always
//!   revokes every session of the target user.
//!
//! ## Collaborators
//!
//! The identity provider (reset links, user records, sessions), the email channel,
//! and the persistence backend (throttle records, tenant roles) sit behind traits in
//! [`reset`]. Production adapters talk HTTP to the identity provider, `SendGrid` for
//! email, and `PostgreSQL` for persistence.
//!
//! ## Caller Trust
//!
//! Admin callers are asserted by the authenticating gateway with headers signed using
//! a shared secret (HMAC-SHA256); unsigned headers count as unauthenticated. Forwarded
//! client addresses are only read from configured trusted proxies.
//!
//! ## Email Channel
//!
//! When no email API key is configured the service returns reset links directly in
//! the response. This is meant for local and headless deployments only; the server
//! logs a warning at startup when it runs without a channel.
//!
//! ## Failure Semantics
//!
//! Nothing is retried internally and nothing is rolled back. A temporary password
//! that was set stays set (and sessions stay revoked) even when the notification
//! email fails afterwards; the failure is returned to the administrator and logged.

pub mod api;
pub mod cli;
pub mod reset;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
