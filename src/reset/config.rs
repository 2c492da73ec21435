//! Startup configuration injected into the workflows.

use secrecy::SecretString;

pub const DEFAULT_REDIRECT_URL: &str = "https://your-app.example.com/login";

#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    from_email: Option<String>,
    email_api_key: Option<SecretString>,
    default_redirect_url: String,
}

impl RecoveryConfig {
    #[must_use]
    pub fn new(default_redirect_url: String) -> Self {
        Self {
            from_email: None,
            email_api_key: None,
            default_redirect_url,
        }
    }

    #[must_use]
    pub fn with_from_email(mut self, from_email: String) -> Self {
        self.from_email = Some(from_email);
        self
    }

    #[must_use]
    pub fn with_email_api_key(mut self, api_key: SecretString) -> Self {
        self.email_api_key = Some(api_key);
        self
    }

    #[must_use]
    pub fn from_email(&self) -> Option<&str> {
        self.from_email.as_deref()
    }

    #[must_use]
    pub fn email_api_key(&self) -> Option<&SecretString> {
        self.email_api_key.as_ref()
    }

    #[must_use]
    pub fn default_redirect_url(&self) -> &str {
        &self.default_redirect_url
    }

    /// The email channel is configured iff an API key is present.
    #[must_use]
    pub fn email_channel_configured(&self) -> bool {
        self.email_api_key.is_some()
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REDIRECT_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn default_config_has_no_channel() {
        let config = RecoveryConfig::default();
        assert!(!config.email_channel_configured());
        assert_eq!(config.default_redirect_url(), DEFAULT_REDIRECT_URL);
        assert!(config.from_email().is_none());
    }

    #[test]
    fn api_key_enables_channel() {
        let config = RecoveryConfig::default()
            .with_from_email("no-reply@example.com".to_string())
            .with_email_api_key(SecretString::from("SG.key".to_string()));
        assert!(config.email_channel_configured());
        assert_eq!(config.from_email(), Some("no-reply@example.com"));
        assert_eq!(
            config.email_api_key().map(|key| key.expose_secret()),
            Some("SG.key")
        );
    }

    #[test]
    fn debug_does_not_print_api_key() {
        let config = RecoveryConfig::default()
            .with_email_api_key(SecretString::from("SG.super-secret".to_string()));
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
