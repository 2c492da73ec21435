//! Email notifications for reset links and temporary passwords.
//!
//! The workflows hold an `Option<Notifier>`: `None` means no email channel is
//! configured and the notification step is skipped entirely. Delivery failures are
//! returned as `NotificationError`; nothing is retried or queued.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::{config::RecoveryConfig, error::RecoveryError, sendgrid::SendGridEmailSender, utils};

pub const RESET_LINK_SUBJECT: &str = "Reset your password";
pub const TEMP_PASSWORD_SUBJECT: &str = "Temporary password issued";

#[derive(Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub from_email: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl std::fmt::Debug for EmailMessage {
    // Bodies may carry reset links or temporary passwords.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailMessage")
            .field("to_email", &self.to_email)
            .field("from_email", &self.from_email)
            .field("subject", &self.subject)
            .field("text_body", &"***")
            .field("html_body", &"***")
            .finish()
    }
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error describing why it was not accepted.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    from_email: String,
}

impl Notifier {
    #[must_use]
    pub fn new(sender: Arc<dyn EmailSender>, from_email: String) -> Self {
        Self { sender, from_email }
    }

    /// Build the `SendGrid` notifier when the config carries an email API key.
    ///
    /// # Errors
    /// Returns an error if an API key is set without a sender address, or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &RecoveryConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.email_api_key() else {
            return Ok(None);
        };
        let from_email = config
            .from_email()
            .map(str::trim)
            .filter(|from| !from.is_empty())
            .context("a sender address (--from-email) is required when an email API key is set")?;
        let sender = SendGridEmailSender::new(api_key.clone())?;
        Ok(Some(Self::new(Arc::new(sender), from_email.to_string())))
    }

    /// # Errors
    /// Returns `Notification` if the channel rejects the message.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), RecoveryError> {
        let message = EmailMessage {
            to_email: to.to_string(),
            from_email: self.from_email.clone(),
            subject: subject.to_string(),
            text_body,
            html_body,
        };
        self.sender.send(&message).await.map_err(|err| {
            error!(subject, "Failed to send email: {err:#}");
            RecoveryError::Notification(format!("{err:#}"))
        })?;
        info!(subject, "email accepted by channel");
        Ok(())
    }

    /// # Errors
    /// Returns `Notification` if the channel rejects the message.
    pub async fn send_reset_link(&self, to: &str, link: &str) -> Result<(), RecoveryError> {
        let escaped = utils::escape_html(link);
        self.send(
            to,
            RESET_LINK_SUBJECT,
            format!("Click the link to reset your password: {link}"),
            format!(
                "<p>Click the link to reset your password:</p><p><a href=\"{escaped}\">{escaped}</a></p>"
            ),
        )
        .await
    }

    /// # Errors
    /// Returns `Notification` if the channel rejects the message.
    pub async fn send_temporary_password(
        &self,
        to: &str,
        temp_password: &str,
    ) -> Result<(), RecoveryError> {
        let escaped = utils::escape_html(temp_password);
        self.send(
            to,
            TEMP_PASSWORD_SUBJECT,
            format!(
                "A temporary password was set by an administrator.\nTemporary password: {temp_password}\nPlease sign in and change it immediately."
            ),
            format!(
                "<p>A temporary password was set by an administrator.</p><p><b>Temporary password:</b> {escaped}</p><p>Please sign in and change it immediately.</p>"
            ),
        )
        .await
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("from_email", &self.from_email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reset::test_support::RecordingSender;
    use secrecy::SecretString;

    fn notifier(sender: &Arc<RecordingSender>) -> Notifier {
        Notifier::new(sender.clone(), "no-reply@example.com".to_string())
    }

    #[tokio::test]
    async fn reset_link_message_contains_link() -> anyhow::Result<()> {
        let sender = Arc::new(RecordingSender::new());
        notifier(&sender)
            .send_reset_link("u@x.com", "https://auth.example.com/reset?oobCode=a&b=c")
            .await?;

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.to_email, "u@x.com");
        assert_eq!(message.from_email, "no-reply@example.com");
        assert_eq!(message.subject, RESET_LINK_SUBJECT);
        assert!(message
            .text_body
            .ends_with("https://auth.example.com/reset?oobCode=a&b=c"));
        assert!(message
            .html_body
            .contains("href=\"https://auth.example.com/reset?oobCode=a&amp;b=c\""));
        Ok(())
    }

    #[tokio::test]
    async fn temporary_password_is_escaped_in_html() -> anyhow::Result<()> {
        let sender = Arc::new(RecordingSender::new());
        notifier(&sender)
            .send_temporary_password("u@x.com", "<b>Pa$$word</b>")
            .await?;

        let message = &sender.sent()[0];
        assert_eq!(message.subject, TEMP_PASSWORD_SUBJECT);
        assert!(message.text_body.contains("Temporary password: <b>Pa$$word</b>"));
        assert!(message.html_body.contains("&lt;b&gt;Pa$$word&lt;/b&gt;"));
        Ok(())
    }

    #[tokio::test]
    async fn channel_failure_is_notification_error() {
        let sender = Arc::new(RecordingSender::failing("503 Service Unavailable"));
        let result = notifier(&sender).send_reset_link("u@x.com", "https://l").await;
        assert!(matches!(result, Err(RecoveryError::Notification(message)) if message.contains("503")));
    }

    #[test]
    fn from_config_without_api_key_is_none() -> anyhow::Result<()> {
        assert!(Notifier::from_config(&RecoveryConfig::default())?.is_none());
        Ok(())
    }

    #[test]
    fn from_config_requires_sender_address() {
        let config = RecoveryConfig::default()
            .with_email_api_key(SecretString::from("SG.key".to_string()));
        assert!(Notifier::from_config(&config).is_err());
    }

    #[test]
    fn from_config_builds_channel() -> anyhow::Result<()> {
        let config = RecoveryConfig::default()
            .with_from_email("no-reply@example.com".to_string())
            .with_email_api_key(SecretString::from("SG.key".to_string()));
        let notifier = Notifier::from_config(&config)?;
        assert!(notifier.is_some());
        Ok(())
    }

    #[test]
    fn message_debug_hides_bodies() {
        let message = EmailMessage {
            to_email: "u@x.com".to_string(),
            from_email: "no-reply@example.com".to_string(),
            subject: TEMP_PASSWORD_SUBJECT.to_string(),
            text_body: "Temporary password: Sup3rSecr3t".to_string(),
            html_body: "<b>Sup3rSecr3t</b>".to_string(),
        };
        assert!(!format!("{message:?}").contains("Sup3rSecr3t"));
    }
}
