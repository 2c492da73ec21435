//! In-memory fakes shared by the reset tests.

use anyhow::bail;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::credentials::{ActionCodeSettings, IdentityProvider, ProviderFailure, ProviderUser};
use super::notify::{EmailMessage, EmailSender};
use super::rate_limit::Clock;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn advance_millis(&self, millis: u64) {
        self.now_ms
            .fetch_add(i64::try_from(millis).unwrap_or(i64::MAX), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderCall {
    ResetLink {
        email: String,
        settings: ActionCodeSettings,
    },
    UserByEmail {
        email: String,
    },
    UpdatePassword {
        uid: String,
        password: String,
    },
    RevokeSessions {
        uid: String,
    },
}

/// Identity provider fake that records every call, including failed ones.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    // lowercase email -> uid
    users: HashMap<String, String>,
    failure: Option<String>,
    revoke_failure: Option<String>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl RecordingProvider {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_user(uid: &str, email: &str) -> Self {
        let mut provider = Self::default();
        provider
            .users
            .insert(email.to_lowercase(), uid.to_string());
        provider
    }

    /// Every operation fails with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Only session revocation fails.
    pub fn failing_revoke(mut self, message: &str) -> Self {
        self.revoke_failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: ProviderCall) -> Result<(), ProviderFailure> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        match &self.failure {
            Some(message) => Err(ProviderFailure::Other(message.clone())),
            None => Ok(()),
        }
    }

    fn uid_for(&self, email: &str) -> Result<&str, ProviderFailure> {
        self.users
            .get(&email.to_lowercase())
            .map(String::as_str)
            .ok_or(ProviderFailure::UserNotFound)
    }

    fn known_uid(&self, uid: &str) -> Result<(), ProviderFailure> {
        if self.users.values().any(|known| known == uid) {
            Ok(())
        } else {
            Err(ProviderFailure::UserNotFound)
        }
    }
}

#[async_trait]
impl IdentityProvider for RecordingProvider {
    async fn password_reset_link(
        &self,
        email: &str,
        settings: &ActionCodeSettings,
    ) -> Result<String, ProviderFailure> {
        self.record(ProviderCall::ResetLink {
            email: email.to_string(),
            settings: settings.clone(),
        })?;
        let uid = self.uid_for(email)?;
        Ok(format!(
            "https://auth.example.com/reset?oobCode=code-{uid}&continueUrl={}",
            settings.continue_url
        ))
    }

    async fn user_by_email(&self, email: &str) -> Result<ProviderUser, ProviderFailure> {
        self.record(ProviderCall::UserByEmail {
            email: email.to_string(),
        })?;
        let uid = self.uid_for(email)?;
        Ok(ProviderUser {
            uid: uid.to_string(),
            email: Some(email.to_string()),
        })
    }

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), ProviderFailure> {
        self.record(ProviderCall::UpdatePassword {
            uid: uid.to_string(),
            password: password.to_string(),
        })?;
        self.known_uid(uid)
    }

    async fn revoke_sessions(&self, uid: &str) -> Result<(), ProviderFailure> {
        self.record(ProviderCall::RevokeSessions {
            uid: uid.to_string(),
        })?;
        if let Some(message) = &self.revoke_failure {
            return Err(ProviderFailure::Other(message.clone()));
        }
        self.known_uid(uid)
    }
}

/// Email channel fake that keeps accepted messages.
#[derive(Debug, Default)]
pub struct RecordingSender {
    failure: Option<String>,
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        if let Some(failure) = &self.failure {
            bail!("{failure}");
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}
