//! `SendGrid` v3 mail-send adapter for [`EmailSender`].

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{Instrument, info_span};
use url::Url;

use super::notify::{EmailMessage, EmailSender};
use crate::APP_USER_AGENT;

pub const SENDGRID_MAIL_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SendGridEmailSender {
    client: Client,
    api_key: SecretString,
    endpoint: Url,
}

impl SendGridEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build SendGrid HTTP client")?;
        let endpoint = Url::parse(SENDGRID_MAIL_SEND_URL).context("invalid SendGrid URL")?;
        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    /// Point the sender at another mail-send endpoint (relays, tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }
}

impl std::fmt::Debug for SendGridEmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridEmailSender")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

fn mail_send_body(message: &EmailMessage) -> Value {
    json!({
        "personalizations": [{ "to": [{ "email": message.to_email }] }],
        "from": { "email": message.from_email },
        "subject": message.subject,
        "content": [
            { "type": "text/plain", "value": message.text_body },
            { "type": "text/html", "value": message.html_body },
        ],
    })
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let span = info_span!("email.send", email.provider = "sendgrid");
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&mail_send_body(message))
            .send()
            .instrument(span)
            .await
            .context("SendGrid request failed")?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let reason = body["errors"][0]["message"]
            .as_str()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"));
        Err(anyhow!("SendGrid returned {status}: {reason}"))
    }
}
