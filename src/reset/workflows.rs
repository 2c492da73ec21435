//! End-to-end handling of self-serve and admin-initiated resets.
//!
//! Flow Overview:
//! - Self-serve: `Validate → RateLimit → IssueLink → (Notify | ReturnLink)`.
//! - Admin: `Validate → Authorize → Dispatch(mode) → (Link | Temp)`.
//!
//! Every step is awaited in order and the first failure aborts the rest. Nothing is
//! retried and nothing is rolled back.

use tracing::{debug, error, info, instrument, warn};

use super::{
    authz::{AuthorizationGate, CallerIdentity},
    config::RecoveryConfig,
    credentials::{CredentialIssuer, validate_temp_password},
    error::RecoveryError,
    notify::Notifier,
    rate_limit::RateLimiter,
    types::{
        AdminResetRequest, AdminResetResponse, PasswordResetRequest, PasswordResetResponse,
        ResetMode,
    },
    utils,
};

pub const SELF_SERVE_WINDOW_SECONDS: u64 = 300;
pub const SELF_SERVE_MAX_ATTEMPTS: usize = 5;

#[derive(Clone, Debug)]
pub struct RecoveryWorkflows {
    config: RecoveryConfig,
    rate_limiter: RateLimiter,
    gate: AuthorizationGate,
    issuer: CredentialIssuer,
    notifier: Option<Notifier>,
}

impl RecoveryWorkflows {
    /// Workflows without an email channel: links are returned to the caller.
    #[must_use]
    pub fn new(
        config: RecoveryConfig,
        rate_limiter: RateLimiter,
        gate: AuthorizationGate,
        issuer: CredentialIssuer,
    ) -> Self {
        Self {
            config,
            rate_limiter,
            gate,
            issuer,
            notifier: None,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Self-serve reset link request.
    ///
    /// The outcome does not reveal whether the account exists, and provider or backend
    /// details are replaced by a generic message.
    ///
    /// # Errors
    /// `InvalidArgument`, `RateLimitExceeded`, `Provider`, `Notification`, `Unavailable`.
    #[instrument(skip_all, fields(app_id = %request.app_id))]
    pub async fn request_password_reset(
        &self,
        request: &PasswordResetRequest,
        client_ip: Option<&str>,
    ) -> Result<PasswordResetResponse, RecoveryError> {
        self.self_serve(request, client_ip).await.map_err(|err| {
            if !matches!(
                err,
                RecoveryError::InvalidArgument(_) | RecoveryError::RateLimitExceeded
            ) {
                error!("Self-serve password reset failed: {err}");
            }
            err.redacted()
        })
    }

    async fn self_serve(
        &self,
        request: &PasswordResetRequest,
        client_ip: Option<&str>,
    ) -> Result<PasswordResetResponse, RecoveryError> {
        let (_, email) = validate_target(&request.app_id, &request.email)?;
        let redirect_url = self.redirect_url(request.continue_url.as_deref())?;

        self.rate_limiter
            .check(
                &utils::self_serve_throttle_key(email, client_ip),
                SELF_SERVE_WINDOW_SECONDS,
                SELF_SERVE_MAX_ATTEMPTS,
            )
            .await?;

        let link = match self.issuer.create_reset_link(email, redirect_url).await {
            Ok(link) => link,
            Err(RecoveryError::UserNotFound) => {
                debug!("no account for reset request, reporting success");
                return Ok(PasswordResetResponse::sent());
            }
            Err(err) => return Err(err),
        };

        match &self.notifier {
            Some(notifier) => {
                notifier.send_reset_link(email, &link).await?;
                Ok(PasswordResetResponse::sent())
            }
            None => Ok(PasswordResetResponse::with_link(link)),
        }
    }

    /// Admin-initiated reset, by link or temporary password.
    ///
    /// A temporary password that was set stays set even when the notification email
    /// fails afterwards; the `Notification` error is returned and logged with the user id.
    ///
    /// # Errors
    /// `InvalidArgument`, `PermissionDenied`, `UserNotFound`, `Provider`, `Notification`,
    /// `Unavailable`.
    #[instrument(skip_all, fields(app_id = %request.app_id, mode))]
    pub async fn admin_reset_password(
        &self,
        request: &AdminResetRequest,
        caller: Option<&CallerIdentity>,
    ) -> Result<AdminResetResponse, RecoveryError> {
        let (app_id, email) = validate_target(&request.app_id, &request.email)?;
        let mode = ResetMode::parse(request.mode.as_deref())?;
        tracing::Span::current().record("mode", tracing::field::debug(mode));
        let temp_password = match mode {
            ResetMode::Temp => Some(validate_temp_password(request.temp_password.as_deref())?),
            ResetMode::Link => None,
        };
        let redirect_url = self.redirect_url(request.continue_url.as_deref())?;

        if !self.gate.is_admin(caller, app_id).await? {
            warn!(
                uid = caller.map(|caller| caller.uid.as_str()),
                "admin reset denied"
            );
            return Err(RecoveryError::PermissionDenied);
        }

        match temp_password {
            None => {
                let link = self.issuer.create_reset_link(email, redirect_url).await?;
                let link = match &self.notifier {
                    Some(notifier) => {
                        notifier.send_reset_link(email, &link).await?;
                        None
                    }
                    None => Some(link),
                };
                Ok(AdminResetResponse {
                    ok: true,
                    mode: ResetMode::Link,
                    link,
                })
            }
            Some(temp_password) => {
                let user = self.issuer.find_user(email).await?;
                self.issuer
                    .issue_temporary_password(&user.uid, temp_password)
                    .await?;
                if let Some(notifier) = &self.notifier {
                    notifier
                        .send_temporary_password(email, temp_password)
                        .await
                        .inspect_err(|err| {
                            error!(
                                user_id = %user.uid,
                                "Temporary password set but notification failed: {err}"
                            );
                        })?;
                }
                info!(user_id = %user.uid, "admin issued temporary password");
                Ok(AdminResetResponse {
                    ok: true,
                    mode: ResetMode::Temp,
                    link: None,
                })
            }
        }
    }

    fn redirect_url<'a>(
        &'a self,
        continue_url: Option<&'a str>,
    ) -> Result<&'a str, RecoveryError> {
        match continue_url.map(str::trim).filter(|url| !url.is_empty()) {
            None => Ok(self.config.default_redirect_url()),
            Some(url) if utils::valid_redirect_url(url) => Ok(url),
            Some(_) => Err(RecoveryError::invalid(
                "continueUrl must be an absolute http(s) URL.",
            )),
        }
    }
}

/// Trimmed `(app_id, email)` or `InvalidArgument`.
fn validate_target<'a>(
    app_id: &'a str,
    email: &'a str,
) -> Result<(&'a str, &'a str), RecoveryError> {
    let app_id = app_id.trim();
    let email = utils::normalize_email(email);
    if app_id.is_empty() || !utils::valid_email(email) {
        return Err(RecoveryError::invalid(
            "appId and a valid email are required.",
        ));
    }
    Ok((app_id, email))
}
