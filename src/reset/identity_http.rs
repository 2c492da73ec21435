//! REST adapter for the identity provider.
//!
//! Endpoints (relative to the configured base URL, bearer service token):
//! - `POST v1/users/password-reset-link` `{ email, continue_url, handle_code_in_app }` → `{ link }`
//! - `GET  v1/users/lookup?email=` → `{ uid, email }`
//! - `PUT  v1/users/{uid}/password` `{ password }`
//! - `POST v1/users/{uid}/sessions/revoke`
//!
//! `404` means the user does not exist; any other non-success status is a provider
//! error carrying `error.message` from the body when present.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use url::Url;

use super::credentials::{ActionCodeSettings, IdentityProvider, ProviderFailure, ProviderUser};
use crate::APP_USER_AGENT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ResetLinkResponse {
    link: String,
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl HttpIdentityProvider {
    /// # Errors
    /// Returns an error if the base URL cannot carry a path or the client cannot be built.
    pub fn new(base_url: Url, token: SecretString) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("identity provider URL cannot be a base: {base_url}"));
        }
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build identity provider HTTP client")?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so path segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ProviderFailure> {
        let span = info_span!("identity.request", identity.operation = operation);
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .instrument(span)
            .await
            .map_err(|err| ProviderFailure::Other(format!("{operation}: {err}")))?;

        let status = response.status();
        debug!(operation, %status, "identity provider responded");
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderFailure::UserNotFound);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["error"]["message"]
            .as_str()
            .map_or_else(|| format!("{operation}: provider returned {status}"), str::to_string);
        Err(ProviderFailure::Other(message))
    }
}

impl std::fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn password_reset_link(
        &self,
        email: &str,
        settings: &ActionCodeSettings,
    ) -> Result<String, ProviderFailure> {
        let request = self
            .client
            .post(self.endpoint(&["v1", "users", "password-reset-link"]))
            .json(&json!({
                "email": email,
                "continue_url": settings.continue_url,
                "handle_code_in_app": settings.handle_code_in_app,
            }));
        let response = self.execute("password_reset_link", request).await?;
        let body: ResetLinkResponse = response
            .json()
            .await
            .map_err(|err| ProviderFailure::Other(format!("invalid reset link response: {err}")))?;
        Ok(body.link)
    }

    async fn user_by_email(&self, email: &str) -> Result<ProviderUser, ProviderFailure> {
        let request = self
            .client
            .get(self.endpoint(&["v1", "users", "lookup"]))
            .query(&[("email", email)]);
        let response = self.execute("user_by_email", request).await?;
        response
            .json()
            .await
            .map_err(|err| ProviderFailure::Other(format!("invalid user lookup response: {err}")))
    }

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), ProviderFailure> {
        let request = self
            .client
            .put(self.endpoint(&["v1", "users", uid, "password"]))
            .json(&json!({ "password": password }));
        self.execute("update_password", request).await?;
        Ok(())
    }

    async fn revoke_sessions(&self, uid: &str) -> Result<(), ProviderFailure> {
        let request = self
            .client
            .post(self.endpoint(&["v1", "users", uid, "sessions", "revoke"]));
        self.execute("revoke_sessions", request).await?;
        Ok(())
    }
}
