//! Credential issuance on top of the identity provider.
//!
//! The provider owns user records, reset links, and sessions. This module only
//! sequences its calls and folds provider failures into [`RecoveryError`].
//!
//! Security boundaries:
//! - Temporary passwords shorter than [`MIN_TEMP_PASSWORD_CHARS`] never reach the provider.
//! - Setting a temporary password is only reachable through
//!   [`CredentialIssuer::issue_temporary_password`], which revokes sessions right after.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::error::RecoveryError;

pub const MIN_TEMP_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("user not found")]
    UserNotFound,
    #[error("{0}")]
    Other(String),
}

impl From<ProviderFailure> for RecoveryError {
    fn from(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::UserNotFound => Self::UserNotFound,
            ProviderFailure::Other(message) => Self::Provider(message),
        }
    }
}

/// Where the reset link lands once the user follows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionCodeSettings {
    pub continue_url: String,
    pub handle_code_in_app: bool,
}

impl ActionCodeSettings {
    #[must_use]
    pub fn in_app(continue_url: &str) -> Self {
        Self {
            continue_url: continue_url.to_string(),
            handle_code_in_app: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProviderUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Operations the identity provider exposes to this service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn password_reset_link(
        &self,
        email: &str,
        settings: &ActionCodeSettings,
    ) -> Result<String, ProviderFailure>;

    async fn user_by_email(&self, email: &str) -> Result<ProviderUser, ProviderFailure>;

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), ProviderFailure>;

    /// Invalidate every session and refresh token issued to `uid`.
    async fn revoke_sessions(&self, uid: &str) -> Result<(), ProviderFailure>;
}

/// Reject temporary passwords that are missing or too short.
///
/// # Errors
/// Returns `InvalidArgument` when the password has fewer than eight characters.
pub fn validate_temp_password(password: Option<&str>) -> Result<&str, RecoveryError> {
    match password {
        Some(password) if password.chars().count() >= MIN_TEMP_PASSWORD_CHARS => Ok(password),
        _ => Err(RecoveryError::invalid(format!(
            "Provide a tempPassword (>= {MIN_TEMP_PASSWORD_CHARS} chars)."
        ))),
    }
}

#[derive(Clone)]
pub struct CredentialIssuer {
    provider: Arc<dyn IdentityProvider>,
}

impl CredentialIssuer {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// # Errors
    /// `UserNotFound` when no account matches, `Provider` for anything else.
    pub async fn create_reset_link(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<String, RecoveryError> {
        let settings = ActionCodeSettings::in_app(redirect_url);
        Ok(self.provider.password_reset_link(email, &settings).await?)
    }

    /// # Errors
    /// `UserNotFound` when no account matches, `Provider` for anything else.
    pub async fn find_user(&self, email: &str) -> Result<ProviderUser, RecoveryError> {
        Ok(self.provider.user_by_email(email).await?)
    }

    /// Set a temporary password, then revoke every session of the user.
    ///
    /// If revocation fails the new password stays in place; the error is returned
    /// so the administrator can retry the whole reset.
    ///
    /// # Errors
    /// `InvalidArgument` for a short password (no provider call), `Provider` or
    /// `UserNotFound` for provider failures.
    pub async fn issue_temporary_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), RecoveryError> {
        self.set_temporary_password(user_id, password).await?;
        self.revoke_sessions(user_id).await.inspect_err(|err| {
            error!(user_id, "Temporary password set but session revocation failed: {err}");
        })?;
        info!(user_id, "temporary password set and sessions revoked");
        Ok(())
    }

    async fn set_temporary_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(), RecoveryError> {
        let password = validate_temp_password(Some(password))?;
        Ok(self.provider.update_password(user_id, password).await?)
    }

    async fn revoke_sessions(&self, user_id: &str) -> Result<(), RecoveryError> {
        Ok(self.provider.revoke_sessions(user_id).await?)
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reset::test_support::{ProviderCall, RecordingProvider};
    use anyhow::Result;

    #[test]
    fn temp_password_length_counts_characters() {
        assert!(validate_temp_password(Some("1234567")).is_err());
        assert!(validate_temp_password(None).is_err());
        assert!(validate_temp_password(Some("12345678")).is_ok());
        // Eight multi-byte characters are long enough.
        assert!(validate_temp_password(Some("ññññññññ")).is_ok());
    }

    #[tokio::test]
    async fn reset_link_is_requested_in_app() -> Result<()> {
        let provider = Arc::new(RecordingProvider::with_user("uid-1", "u@x.com"));
        let issuer = CredentialIssuer::new(provider.clone());

        let link = issuer
            .create_reset_link("u@x.com", "https://app.example.com/login")
            .await?;

        assert!(link.starts_with("https://auth.example.com/reset?"));
        assert_eq!(
            provider.calls(),
            vec![ProviderCall::ResetLink {
                email: "u@x.com".to_string(),
                settings: ActionCodeSettings {
                    continue_url: "https://app.example.com/login".to_string(),
                    handle_code_in_app: true,
                },
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_maps_to_user_not_found() {
        let provider = Arc::new(RecordingProvider::empty());
        let issuer = CredentialIssuer::new(provider);

        let result = issuer
            .create_reset_link("ghost@x.com", "https://app.example.com/login")
            .await;
        assert_eq!(result, Err(RecoveryError::UserNotFound));
    }

    #[tokio::test]
    async fn other_provider_failures_pass_message_through() {
        let provider =
            Arc::new(RecordingProvider::with_user("uid-1", "u@x.com").failing("quota exceeded"));
        let issuer = CredentialIssuer::new(provider);

        let result = issuer
            .create_reset_link("u@x.com", "https://app.example.com/login")
            .await;
        assert_eq!(result, Err(RecoveryError::Provider("quota exceeded".into())));
    }

    #[tokio::test]
    async fn temporary_password_revokes_sessions_after_update() -> Result<()> {
        let provider = Arc::new(RecordingProvider::with_user("uid-1", "u@x.com"));
        let issuer = CredentialIssuer::new(provider.clone());

        issuer
            .issue_temporary_password("uid-1", "Sup3rSecr3t")
            .await?;

        assert_eq!(
            provider.calls(),
            vec![
                ProviderCall::UpdatePassword {
                    uid: "uid-1".to_string(),
                    password: "Sup3rSecr3t".to_string(),
                },
                ProviderCall::RevokeSessions {
                    uid: "uid-1".to_string()
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn short_temporary_password_never_reaches_provider() {
        let provider = Arc::new(RecordingProvider::with_user("uid-1", "u@x.com"));
        let issuer = CredentialIssuer::new(provider.clone());

        let result = issuer.issue_temporary_password("uid-1", "short12").await;

        assert!(matches!(result, Err(RecoveryError::InvalidArgument(_))));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_update_skips_revocation() {
        let provider =
            Arc::new(RecordingProvider::with_user("uid-1", "u@x.com").failing("weak password"));
        let issuer = CredentialIssuer::new(provider.clone());

        let result = issuer.issue_temporary_password("uid-1", "Sup3rSecr3t").await;

        assert_eq!(result, Err(RecoveryError::Provider("weak password".into())));
        assert!(!provider
            .calls()
            .iter()
            .any(|call| matches!(call, ProviderCall::RevokeSessions { .. })));
    }
}
